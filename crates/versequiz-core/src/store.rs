//! Multi-user JSON store for sessions, settings, and verse scores.
//!
//! Every mutation is applied to a copy of the database, written to a
//! temporary file, renamed over the store file, and only then swapped into
//! memory. A failed write leaves the in-memory state untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QuizError, QuizResult};
use crate::history::SessionRecord;
use crate::ledger::VerseScores;
use crate::model::Settings;

pub const DEFAULT_DATA_FILE: &str = "quiz_stats.json";
/// Owner of data found in a pre-multi-user store file.
pub const MIGRATED_USER: &str = "_migrated";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub verse_scores: VerseScores,
    /// Fields this version does not know about, kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UserData {
    pub fn find_session(&self, id: &str) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Apply a finished session: update verse scores from its details, then
    /// replace the session it retakes or append it.
    pub fn apply_session(&mut self, mut record: SessionRecord) {
        self.verse_scores.apply_details(&record.details);

        let target = record
            .origin_session_id
            .as_deref()
            .and_then(|origin| self.sessions.iter().position(|s| s.id == origin));
        match target {
            Some(idx) => {
                record.id = self.sessions[idx].id.clone();
                self.sessions[idx] = record;
            }
            None => self.sessions.push(record),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub users: BTreeMap<String, UserData>,
}

impl Database {
    /// Parse a store document, migrating the legacy single-user layout and
    /// filling in defaults for anything missing or malformed.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            tracing::warn!("store root is not an object, starting empty");
            return Self::default();
        };

        let mut users = BTreeMap::new();
        match root.remove("users") {
            Some(Value::Object(map)) => {
                for (name, raw) in map {
                    let user = user_from_value(&name, raw);
                    users.insert(name, user);
                }
            }
            Some(_) => tracing::warn!("store `users` is not an object, ignoring it"),
            None => {
                let legacy = ["sessions", "settings", "verseScores"]
                    .iter()
                    .any(|k| root.contains_key(*k));
                if legacy {
                    tracing::info!("migrating single-user store to user {MIGRATED_USER}");
                    users.insert(
                        MIGRATED_USER.to_string(),
                        user_from_value(MIGRATED_USER, Value::Object(root)),
                    );
                }
            }
        }
        Self { users }
    }
}

fn user_from_value(name: &str, raw: Value) -> UserData {
    let Value::Object(mut fields) = raw else {
        tracing::warn!("user {name} is not an object, resetting to defaults");
        return UserData::default();
    };

    let sessions = match fields.remove("sessions") {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("dropping unreadable session {i} of user {name}: {e}");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    let settings = fields
        .remove("settings")
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let verse_scores = match fields.remove("verseScores") {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| {
                let score = v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64))?;
                Some((k, score.min(u32::MAX as u64) as u32))
            })
            .collect(),
        _ => VerseScores::new(),
    };

    UserData {
        sessions,
        settings,
        verse_scores,
        extra: fields.into_iter().collect(),
    }
}

/// File-backed database handle.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    db: Database,
}

impl Store {
    /// Open the store at `path`. A missing or unreadable file opens empty;
    /// an unreadable one is first copied to `<path>.bak`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let db = match load_database(&path) {
            Ok(db) => db,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("{e:#}; starting with an empty store");
                    backup(&path);
                }
                Database::default()
            }
        };
        Self { path, db }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn user(&self, name: &str) -> Option<&UserData> {
        self.db.users.get(name)
    }

    /// The user's data, or defaults for an unknown user.
    pub fn user_or_default(&self, name: &str) -> UserData {
        self.user(name).cloned().unwrap_or_default()
    }

    fn commit<T>(&mut self, user: &str, change: impl FnOnce(&mut UserData) -> T) -> QuizResult<T> {
        let mut next = self.db.clone();
        let out = change(next.users.entry(user.to_string()).or_default());
        write_database(&self.path, &next).map_err(QuizError::Persistence)?;
        self.db = next;
        Ok(out)
    }

    /// Persist a finished session and its verse score deltas together.
    pub fn commit_session(&mut self, user: &str, record: SessionRecord) -> QuizResult<()> {
        let id = record.id.clone();
        let total = record.total;
        self.commit(user, |u| u.apply_session(record))?;
        tracing::info!("saved session {id} ({total} questions) for {user}");
        Ok(())
    }

    pub fn update_settings(&mut self, user: &str, settings: Settings) -> QuizResult<()> {
        self.commit(user, |u| u.settings = settings)
    }

    /// Clear sessions and scores and restore default settings.
    pub fn reset_user(&mut self, user: &str) -> QuizResult<()> {
        self.commit(user, |u| {
            u.sessions.clear();
            u.settings = Settings::default();
            u.verse_scores.clear();
        })?;
        tracing::info!("reset all data for {user}");
        Ok(())
    }

    /// Remove a session by id. Returns how many were removed.
    pub fn delete_session(&mut self, user: &str, id: &str) -> QuizResult<usize> {
        self.commit(user, |u| {
            let before = u.sessions.len();
            u.sessions.retain(|s| s.id != id);
            before - u.sessions.len()
        })
    }

    /// Drop one verse from the score ledger. Returns whether it was present.
    pub fn forget_verse(&mut self, user: &str, key: &str) -> QuizResult<bool> {
        self.commit(user, |u| u.verse_scores.remove(key))
    }

    pub fn clear_scores(&mut self, user: &str) -> QuizResult<()> {
        self.commit(user, |u| u.verse_scores.clear())
    }
}

fn load_database(path: &Path) -> Result<Database> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read store from {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse store JSON in {}", path.display()))?;
    Ok(Database::from_value(value))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Keep a copy of a store file that is about to be replaced by an empty one.
fn backup(path: &Path) {
    let bak = with_suffix(path, ".bak");
    match std::fs::copy(path, &bak) {
        Ok(_) => tracing::warn!("kept a copy of the unreadable store at {}", bak.display()),
        Err(e) => tracing::warn!("could not back up {} to {}: {e}", path.display(), bak.display()),
    }
}

fn write_database(path: &Path, db: &Database) -> Result<()> {
    let json = serde_json::to_string_pretty(db).context("failed to serialize store")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let tmp = with_suffix(path, ".tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write store to {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace store at {}", path.display()))?;
    Ok(())
}
