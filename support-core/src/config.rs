use crate::error::SupportError;
use crate::model::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_STATUS_POLL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base_url: String,
    /// Model reported while the backend has not listed any.
    pub default_model: String,
    /// Forces a model for analysis instead of the one the backend reports.
    pub analysis_model: Option<String>,
    pub status_poll_secs: u64,
    /// `0` disables the timeout.
    pub request_timeout_secs: u64,
    pub notifications: bool,
    pub auto_refresh: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            default_model: DEFAULT_MODEL.into(),
            analysis_model: None,
            status_poll_secs: DEFAULT_STATUS_POLL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            notifications: true,
            auto_refresh: false,
        }
    }
}

impl DashboardConfig {
    /// Reads the TOML file when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SupportError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, SupportError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SupportError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| SupportError::Config(format!("{}: {e}", path.display())))
    }

    /// Applies `SUPPORT_*` overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, SupportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SUPPORT_API_URL") {
            self.api_base_url = url;
        }
        if let Some(model) = lookup("SUPPORT_MODEL") {
            self.analysis_model = Some(model);
        }
        if let Some(secs) = lookup("SUPPORT_POLL_SECS") {
            self.status_poll_secs = parse_secs("SUPPORT_POLL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("SUPPORT_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_secs("SUPPORT_TIMEOUT_SECS", &secs)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SupportError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SupportError::Config(format!(
                "api_base_url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.status_poll_secs == 0 {
            return Err(SupportError::Config("status_poll_secs must be positive".into()));
        }
        if self.default_model.trim().is_empty() {
            return Err(SupportError::Config("default_model is required".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, SupportError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| SupportError::Config(format!("{key} must be a whole number of seconds")))
}
