//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::deploy::monitor::MonitorOptions;
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// deployctl settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write the run log to files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Deployment server configuration
    pub server: ServerSettings,

    /// Status polling configuration
    #[serde(default)]
    pub polling: PollingSettings,

    /// Copy non-secure application properties into the property store after a deploy
    #[serde(default = "default_true")]
    pub harvest_properties: bool,

    /// Property store file, defaults to the storage layout's location
    #[serde(default)]
    pub property_store: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(file: &File) -> Result<Self, DeployError> {
        if !file.exists().await {
            return Err(DeployError::ConfigError(format!(
                "Settings file does not exist: {}",
                file.path().display()
            )));
        }
        let settings: Settings = file.read_json().await?;
        settings.server.validate()?;
        Ok(settings)
    }
}

/// Deployment server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Base URL of the deployment server, e.g. `https://deploy.example.com:8443`
    pub base_url: String,

    pub username: String,

    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Accept any TLS certificate the server presents
    #[serde(default)]
    pub trust_all_certs: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl ServerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), DeployError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            DeployError::ConfigError(format!("Invalid server URL '{}': {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DeployError::ConfigError(format!(
                "Unsupported server URL scheme '{}'",
                scheme
            ))),
        }
    }
}

/// Status polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Delay between status queries, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Give up waiting after this many seconds. Unset waits forever.
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

fn default_interval_ms() -> u64 {
    3000
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_wait_secs: None,
        }
    }
}

impl PollingSettings {
    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            interval: Duration::from_millis(self.interval_ms),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
        }
    }
}

/// Read a plain JSON string into a secret
pub(crate) fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}
