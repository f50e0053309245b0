//! Ascend Configuration (v0.4.0)
//!
//! Where learner data lives, which catalog to load, log verbosity, and streak
//! milestones.
//! Config file: --config, $ASCEND_CONFIG, or ~/.config/ascend/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::progression::DEFAULT_MILESTONES;

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "ASCEND_CONFIG";

/// File locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Learner snapshot (JSON)
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Command journal (JSONL)
    #[serde(default = "default_journal_file")]
    pub journal_file: PathBuf,

    /// Content catalog (TOML); an empty catalog is used when unset
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            journal_file: default_journal_file(),
            catalog_file: None,
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("ascend"))
        .unwrap_or_else(|| PathBuf::from(".ascend"))
}

fn default_state_file() -> PathBuf {
    data_dir().join("learner.json")
}

fn default_journal_file() -> PathBuf {
    data_dir().join("journal.jsonl")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when ASCEND_LOG is not set (e.g. "info", "ascend_common=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Streak settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
        }
    }
}

fn default_milestones() -> Vec<u32> {
    DEFAULT_MILESTONES.to_vec()
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscendConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub streaks: StreakConfig,
}

impl AscendConfig {
    /// Default user config path: ~/.config/ascend/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ascend").join("config.toml"))
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. $ASCEND_CONFIG (must exist)
    /// 3. User config, if present
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            if !env_path.is_empty() {
                return Self::load_from(Path::new(&env_path));
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        Ok(Self::default())
    }

    /// Load a specific file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: AscendConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.paths.rebase(base);
        }
        Ok(config)
    }

    /// Write configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, toml_string).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl PathsConfig {
    fn rebase(&mut self, base: &Path) {
        let join = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.state_file = join(&self.state_file);
        self.journal_file = join(&self.journal_file);
        self.catalog_file = self.catalog_file.as_deref().map(join);
    }
}
