use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlightcheckConfig {
    /// Where the inference service lives
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Web UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Connection settings for the inference service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL; `/predict` and `/ping` are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Web UI server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl BlightcheckConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: BlightcheckConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Replace the inference base URL, e.g. from `--endpoint`
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Result<Self> {
        if let Some(endpoint) = endpoint {
            self.inference.base_url = endpoint;
            self.validate()?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = &self.inference.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!(
                "inference.base_url must start with http:// or https://, got {:?}",
                base_url
            );
        }
        if self.inference.timeout_secs == 0 {
            bail!("inference.timeout_secs must be greater than zero");
        }
        if self.ui.max_upload_bytes == 0 {
            bail!("ui.max_upload_bytes must be greater than zero");
        }
        Ok(())
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        Self {
            inference: InferenceConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 30,
            },
            ui: UiConfig::default(),
        }
    }
}
