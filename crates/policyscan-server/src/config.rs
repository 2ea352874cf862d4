//! Server configuration

use policyscan_analysis::{AnalysisConfig, PatternRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Pattern set file; the built-in set is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns_path: Option<PathBuf>,

    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Pipeline settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl ServerConfig {
    /// Load configuration from file, or defaults if the file does not exist
    pub fn load(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            info!(
                "No configuration at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than zero");
        }
        self.analysis.validate()?;
        Ok(())
    }

    /// Load the configured pattern set
    pub fn load_registry(&self) -> policyscan_core::Result<PatternRegistry> {
        match &self.patterns_path {
            Some(path) => PatternRegistry::from_file(path),
            None => {
                info!("Using built-in pattern set");
                PatternRegistry::builtin()
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            patterns_path: None,
            max_upload_bytes: default_max_upload_bytes(),
            analysis: AnalysisConfig::default(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}
