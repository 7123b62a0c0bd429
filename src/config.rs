//! Configuration handling for the wizard

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default report API address
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration for the wizard
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WizardConfig {
    /// Base URL of the report API
    pub api_url: Option<String>,
    /// Bearer token issued by the identity provider
    pub api_token: Option<String>,
    /// Report to open
    pub report_id: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

impl WizardConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "brsr", "brsr-tui")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::config_path() {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                config = serde_json::from_str(&content)?;
                tracing::debug!(path = %path.display(), "loaded config file");
            }
        }

        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Replace fields with values found through `lookup`
    /// (`BRSR_API_URL`, `BRSR_API_TOKEN`, `BRSR_REPORT_ID`)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("BRSR_API_URL") {
            self.api_url = Some(v);
        }
        if let Some(v) = lookup("BRSR_API_TOKEN") {
            self.api_token = Some(v);
        }
        if let Some(v) = lookup("BRSR_REPORT_ID") {
            self.report_id = Some(v);
        }
        self
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_API_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
