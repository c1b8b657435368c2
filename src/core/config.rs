use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "datafuzz.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FuzzConfig {
    pub dataset: DatasetConfig,
    pub strategy: StrategyDefaults,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Materialize files, SQL results and plain row lists as a labeled table.
    pub prefer_tabular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyDefaults {
    /// Used when a strategy entry has no `percentage` (1-100 scale).
    pub default_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            prefer_tabular: true,
        }
    }
}

impl Default for StrategyDefaults {
    fn default() -> Self {
        Self {
            default_percentage: 30.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FuzzConfig {
    /// Load `datafuzz.toml` from the working directory, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Ok(content) = fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    "failed to parse config: {}. Using defaults.",
                    e
                ),
            }
        }
        Self::default()
    }
}
