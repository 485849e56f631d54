pub mod console;
pub mod exam;
pub mod forget;
pub mod init;
pub mod leaderboard;
pub mod practice;
pub mod reset;
pub mod retake;
pub mod settings;
pub mod stats;
pub mod validate;
pub mod worst;

use std::path::PathBuf;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use versequiz_core::config::{expand_path, load_config_from, VersequizConfig};
use versequiz_core::model::{Corpus, QuestionType, Settings};
use versequiz_core::parser::load_corpus;
use versequiz_core::store::Store;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub user: Option<String>,
    pub verses: Option<PathBuf>,
    pub data: Option<PathBuf>,
}

/// Resolved configuration plus command-line overrides.
pub struct Context {
    pub config: VersequizConfig,
    pub user: String,
}

impl Context {
    pub fn load(opts: GlobalOpts) -> Result<Self> {
        let mut config = load_config_from(opts.config.as_deref())?;
        if let Some(v) = opts.verses {
            config.verses_file = expand_path(&v);
        }
        if let Some(d) = opts.data {
            config.data_file = expand_path(&d);
        }
        let user = opts.user.unwrap_or_else(|| config.username.clone());
        Ok(Self { config, user })
    }

    pub fn corpus(&self) -> Result<Corpus> {
        let load = load_corpus(&self.config.verses_file)?;
        if load.skipped_rows() > 0 {
            tracing::warn!(
                "skipped {} unusable row(s) in {}",
                load.skipped_rows(),
                self.config.verses_file.display()
            );
        }
        tracing::info!(
            "loaded {} verses from {}",
            load.corpus.len(),
            self.config.verses_file.display()
        );
        Ok(load.corpus)
    }

    pub fn store(&self) -> Store {
        Store::open(&self.config.data_file)
    }

    /// The user's saved settings, or the configured defaults for a new user.
    pub fn settings(&self, store: &Store) -> Settings {
        store
            .user(&self.user)
            .map(|u| u.settings.clone())
            .unwrap_or_else(|| self.config.initial_settings())
    }

    /// Settings with per-run overrides applied.
    pub fn settings_with(
        &self,
        store: &Store,
        questions: Option<u32>,
        types: Vec<QuestionType>,
    ) -> Settings {
        let mut settings = self.settings(store);
        if let Some(n) = questions {
            settings.num_questions = n;
        }
        if !types.is_empty() {
            settings.enabled_qtypes = types;
        }
        settings
    }
}

pub fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
