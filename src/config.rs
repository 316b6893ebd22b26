//! Layered configuration: built-in defaults, an optional TOML file, then the
//! environment. CLI flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::llm::GenerationConfig;
use crate::memory::{Importance, InvalidImportance};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing API key: set API_KEY or OPENAI_API_KEY")]
    MissingApiKey,

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid tutor.min_recorded_importance: {0}")]
    InvalidImportance(#[from] InvalidImportance),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_seconds: u64,
    pub conversation: GenerationConfig,
    pub analysis: GenerationConfig,
    pub feedback: GenerationConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            request_timeout_seconds: 60,
            conversation: GenerationConfig::default(),
            analysis: GenerationConfig::default().with_temperature(0.2),
            feedback: GenerationConfig {
                max_tokens: 1200,
                temperature: 0.7,
            },
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("language_learning.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// Mistakes below this importance are not recorded for the session.
    pub min_recorded_importance: i64,
    /// Prior (utterance, reply) pairs sent along with each new turn.
    pub history_turns: usize,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            min_recorded_importance: 1,
            history_turns: 20,
        }
    }
}

impl TutorConfig {
    pub fn recording_threshold(&self) -> Result<Importance, ConfigError> {
        Ok(Importance::new(self.min_recorded_importance)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub tutor: TutorConfig,
}

impl Config {
    /// Defaults, overlaid by `path` when given, overlaid by the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overlays environment values found through `lookup`. Blank values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("API_URL") {
            self.llm.api_url = url;
        }
        if let Some(db) = get("LINGUABOT_DB") {
            self.storage.db_path = PathBuf::from(db);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .llm
            .api_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty())
        {
            return Err(ConfigError::MissingApiKey);
        }

        Url::parse(&self.llm.api_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.llm.api_url.clone(),
            reason: e.to_string(),
        })?;

        self.tutor.recording_threshold()?;

        debug!(
            model = %self.llm.model,
            api_url = %self.llm.api_url,
            db_path = %self.storage.db_path.display(),
            "Configuration validated"
        );
        Ok(())
    }
}
