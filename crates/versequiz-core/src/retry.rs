//! Deferred re-queue of missed and skipped verses.
//!
//! Entries are keyed by verse key (at most one entry per verse) and ordered
//! by `(due_at, insertion sequence)` so the earliest-due entry is found
//! without scanning.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;

use crate::model::Verse;

/// Smallest number of attempts before a missed verse comes back.
pub const MIN_RETRY_GAP: u64 = 3;
/// Largest number of attempts before a missed verse comes back.
pub const MAX_RETRY_GAP: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEntry {
    pub key: String,
    pub verse: Verse,
    /// Attempt count at or after which the verse is served again.
    pub due_at: u64,
    /// How many misses have been merged into this entry.
    pub tries: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    entry: RetryEntry,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RetryScheduler {
    slots: HashMap<String, Slot>,
    by_due: BTreeMap<(u64, u64), String>,
    next_seq: u64,
}

impl RetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `verse` with a random gap in `[MIN_RETRY_GAP, MAX_RETRY_GAP]`.
    pub fn schedule_miss<R: Rng + ?Sized>(
        &mut self,
        verse: &Verse,
        attempts_so_far: u64,
        rng: &mut R,
    ) -> &RetryEntry {
        let gap = rng.gen_range(MIN_RETRY_GAP..=MAX_RETRY_GAP);
        self.schedule(verse, attempts_so_far + gap)
    }

    /// Queue `verse` for `due_at`. An existing entry keeps the earlier due
    /// point and counts one more try.
    pub fn schedule(&mut self, verse: &Verse, due_at: u64) -> &RetryEntry {
        let key = verse.key();
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.entry.tries += 1;
            if due_at < slot.entry.due_at {
                self.by_due.remove(&(slot.entry.due_at, slot.seq));
                slot.entry.due_at = due_at;
                self.by_due.insert((due_at, slot.seq), key.clone());
            }
            tracing::debug!(
                "retry merged for {key}: due {} tries {}",
                slot.entry.due_at,
                slot.entry.tries
            );
        } else {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.by_due.insert((due_at, seq), key.clone());
            self.slots.insert(
                key.clone(),
                Slot {
                    entry: RetryEntry {
                        key: key.clone(),
                        verse: verse.clone(),
                        due_at,
                        tries: 1,
                    },
                    seq,
                },
            );
            tracing::debug!("retry queued for {key}: due {due_at}");
        }
        &self.slots[&key].entry
    }

    /// Drop any pending entry for `key`. Returns whether one existed.
    pub fn discard(&mut self, key: &str) -> bool {
        match self.slots.remove(key) {
            Some(slot) => {
                self.by_due.remove(&(slot.entry.due_at, slot.seq));
                true
            }
            None => false,
        }
    }

    /// Remove and return the earliest-due entry if it is due at `attempt`.
    pub fn pop_due(&mut self, attempt: u64) -> Option<RetryEntry> {
        let (&(due_at, seq), _) = self.by_due.iter().next()?;
        if due_at > attempt {
            return None;
        }
        let key = self.by_due.remove(&(due_at, seq))?;
        self.slots.remove(&key).map(|slot| slot.entry)
    }

    pub fn get(&self, key: &str) -> Option<&RetryEntry> {
        self.slots.get(key).map(|slot| &slot.entry)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entries in service order.
    pub fn iter(&self) -> impl Iterator<Item = &RetryEntry> {
        self.by_due.values().map(|key| &self.slots[key].entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn verse(n: u32) -> Verse {
        Verse::new("Mark", 1, n, format!("verse {n}"))
    }

    #[test]
    fn miss_is_due_within_window() {
        let mut rng = StdRng::seed_from_u64(11);
        for t in 0..50u64 {
            let mut q = RetryScheduler::new();
            let due = q.schedule_miss(&verse(1), t, &mut rng).due_at;
            assert!((t + 3..=t + 5).contains(&due), "due {due} at attempt {t}");
        }
    }

    #[test]
    fn repeat_miss_merges_and_only_moves_earlier() {
        let mut q = RetryScheduler::new();
        q.schedule(&verse(1), 8);
        let e = q.schedule(&verse(1), 10);
        assert_eq!(e.due_at, 8);
        assert_eq!(e.tries, 2);
        let e = q.schedule(&verse(1), 6);
        assert_eq!(e.due_at, 6);
        assert_eq!(e.tries, 3);
        assert_eq!(q.len(), 1);
        assert_eq!(q.iter().count(), 1);
    }

    #[test]
    fn pop_due_respects_attempt_and_order() {
        let mut q = RetryScheduler::new();
        q.schedule(&verse(1), 5);
        q.schedule(&verse(2), 4);
        q.schedule(&verse(3), 4);
        assert!(q.pop_due(3).is_none());
        assert_eq!(q.pop_due(4).unwrap().key, "Mark|1|2");
        assert_eq!(q.pop_due(4).unwrap().key, "Mark|1|3");
        assert!(q.pop_due(4).is_none());
        assert_eq!(q.pop_due(9).unwrap().key, "Mark|1|1");
        assert!(q.is_empty());
    }

    #[test]
    fn discard_removes_entry() {
        let mut q = RetryScheduler::new();
        q.schedule(&verse(1), 3);
        q.schedule(&verse(2), 3);
        assert!(q.discard("Mark|1|1"));
        assert!(!q.discard("Mark|1|1"));
        assert_eq!(q.pop_due(3).unwrap().key, "Mark|1|2");
        assert!(q.pop_due(100).is_none());
    }

    #[test]
    fn merged_entry_keeps_its_queue_position_on_ties() {
        let mut q = RetryScheduler::new();
        q.schedule(&verse(1), 7);
        q.schedule(&verse(2), 4);
        q.schedule(&verse(1), 4);
        let order: Vec<&str> = q.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(order, vec!["Mark|1|1", "Mark|1|2"]);
    }
}
