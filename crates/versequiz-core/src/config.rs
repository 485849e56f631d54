//! Application configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{QuestionType, Settings};
use crate::store::DEFAULT_DATA_FILE;
use crate::weights::WeightParams;

/// Settings applied to users who have not saved their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSettings {
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default = "default_qtypes")]
    pub enabled_qtypes: Vec<QuestionType>,
}

fn default_num_questions() -> u32 {
    Settings::default().num_questions
}
fn default_qtypes() -> Vec<QuestionType> {
    QuestionType::ALL.to_vec()
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            num_questions: default_num_questions(),
            enabled_qtypes: default_qtypes(),
        }
    }
}

impl From<&DefaultSettings> for Settings {
    fn from(d: &DefaultSettings) -> Self {
        Settings {
            num_questions: d.num_questions,
            enabled_qtypes: d.enabled_qtypes.clone(),
        }
    }
}

/// Top-level versequiz configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersequizConfig {
    /// Multi-user store file.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Verse corpus CSV.
    #[serde(default = "default_verses_file")]
    pub verses_file: PathBuf,
    /// User whose history is read and written when none is given.
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub default_settings: DefaultSettings,
    /// Practice-mode weighting coefficients.
    #[serde(default)]
    pub weights: WeightParams,
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}
fn default_verses_file() -> PathBuf {
    PathBuf::from("verses.csv")
}
fn default_username() -> String {
    "default".to_string()
}

impl Default for VersequizConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            verses_file: default_verses_file(),
            username: default_username(),
            default_settings: DefaultSettings::default(),
            weights: WeightParams::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to nothing.
pub fn resolve_env_vars(s: &str) -> String {
    resolve_with(s, |name| std::env::var(name).ok())
}

fn resolve_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = lookup(&result[start + 2..start + end]).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

impl VersequizConfig {
    /// Apply `VERSEQUIZ_VERSES_FILE` (or the older `VERSES_FILE`) and
    /// `VERSEQUIZ_DATA_FILE` from `lookup`, then expand `${VAR}` in paths.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("VERSEQUIZ_VERSES_FILE").or_else(|| lookup("VERSES_FILE")) {
            self.verses_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("VERSEQUIZ_DATA_FILE") {
            self.data_file = PathBuf::from(v);
        }
        self.verses_file = PathBuf::from(resolve_with(&self.verses_file.to_string_lossy(), &lookup));
        self.data_file = PathBuf::from(resolve_with(&self.data_file.to_string_lossy(), &lookup));
    }

    /// Settings for a user with none saved.
    pub fn initial_settings(&self) -> Settings {
        Settings::from(&self.default_settings)
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `versequiz.toml` in the current directory
/// 2. `~/.config/versequiz/config.toml`
///
/// Environment variable overrides: `VERSEQUIZ_VERSES_FILE`, `VERSEQUIZ_DATA_FILE`.
pub fn load_config() -> Result<VersequizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VersequizConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("versequiz.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<VersequizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => VersequizConfig::default(),
    };

    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("versequiz"))
}

/// Expand `${VAR}` references in a path given on the command line.
pub fn expand_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}
