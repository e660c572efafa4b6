use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_cool_down_minutes")]
    pub cool_down_minutes: u64,
    #[serde(default = "default_recipients")]
    pub recipients: Vec<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_source_address")]
    pub source_address: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_service_name() -> String { "RabbitMQ".into() }
fn default_cool_down_minutes() -> u64 { 60 }
fn default_region() -> String { "ap-south-1".into() }
fn default_source_address() -> String { "admin01@readywire.com".into() }
fn default_api_port() -> u16 { 8080 }
fn default_ip_lookup_url() -> String { "https://api.ipify.org?format=text".into() }
pub fn default_timeout() -> u64 { 10_000 }

fn default_recipients() -> Vec<String> {
    [
        "nikhils@readywire.com",
        "sanjayp@readywire.com",
        "arpithak@readywire.com",
        "amans@readywire.com",
        "helpdesk@kensium.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            cool_down_minutes: default_cool_down_minutes(),
            recipients: default_recipients(),
            region: default_region(),
            source_address: default_source_address(),
            api_port: default_api_port(),
            ip_lookup_url: default_ip_lookup_url(),
            request_timeout_ms: default_timeout(),
            probe_timeout_ms: default_timeout(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid config format: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Validation(String),
}

impl MonitorConfig {
    /// Reads `path` if it exists, otherwise falls back to the built-in defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: MonitorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Validation("service_name cannot be empty".to_string()));
        }

        if self.recipients.is_empty() {
            return Err(ConfigError::Validation("recipients cannot be empty".to_string()));
        }

        if self.source_address.trim().is_empty() {
            return Err(ConfigError::Validation("source_address cannot be empty".to_string()));
        }

        for (name, value) in [
            ("cool_down_minutes", self.cool_down_minutes),
            ("request_timeout_ms", self.request_timeout_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{} must be greater than 0", name)));
            }
        }

        Ok(())
    }

    pub fn cool_down(&self) -> Duration {
        Duration::from_secs(self.cool_down_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
