//! Configuration for the collar simulator
//!
//! All tunables live in one TOML file; nothing is read from process-wide
//! globals. The publish interval is deliberately NOT here — it is re-fetched
//! from the parameter store on every tick (see `cadence`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    pub device: DeviceSection,
    #[serde(default)]
    pub mqtt: MqttSection,
    pub sources: SourcesSection,
    pub settings: SettingsSection,
}

/// Identity and behavior of the simulated device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSection {
    /// MQTT client identifier (must match [a-zA-Z0-9._-]+)
    pub client_id: String,
    /// Name of the combined key+certificate secret in the secret store
    pub secret_name: String,
    /// Which telemetry encoder this device runs
    pub encoder: EncoderKind,
    /// Testing mode: build payloads but never touch the network
    #[serde(default)]
    pub testing: bool,
    /// Number of simulated collars in the herd
    #[serde(default = "default_herd_size")]
    pub herd_size: usize,
}

/// Telemetry flavor produced by the device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// Positional fixes (lat/lon per collar)
    Position,
    /// Biometric vitals samples
    Vitals,
}

/// MQTT session tuning. Defaults mirror the device's historical settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// Broker port (TLS)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Endpoint category passed to the endpoint resolver
    #[serde(default = "default_endpoint_kind")]
    pub endpoint_kind: String,
    /// Connect/disconnect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Per-operation (publish ack) timeout in seconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
    /// Offline-queue draining interval in seconds
    #[serde(default = "default_draining_interval")]
    pub draining_interval_secs: u64,
    /// Keep-alive interval in seconds. The event loop is only driven during
    /// connect and publish, so no pings are sent while the loop sleeps: keep
    /// the publish interval below this value or the broker will drop the
    /// session between ticks and every publish will pay a full reconnect.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            endpoint_kind: default_endpoint_kind(),
            connect_timeout_secs: default_connect_timeout(),
            operation_timeout_secs: default_operation_timeout(),
            draining_interval_secs: default_draining_interval(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

/// Locations of the external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcesSection {
    /// Base URL of the secret-store facade
    pub secret_store_url: String,
    /// Base URL of the parameter-store facade
    pub parameter_store_url: String,
    /// Base URL of the broker endpoint lookup facade
    pub endpoint_api_url: String,
    /// Well-known trust repository URL for the root CA
    #[serde(default = "default_trust_root_url")]
    pub trust_root_url: String,
    /// Directory where credential artifacts are materialized
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Optional remote log mirror endpoint (best effort)
    pub log_mirror_url: Option<String>,
}

/// Parameter names and loop timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingsSection {
    /// Parameter holding the publish topic name (required, read once at start)
    pub topic_parameter: String,
    /// Parameter holding the publish interval (best effort, read every tick)
    pub interval_parameter: String,
    /// Interval used whenever the parameter store is unreachable
    #[serde(default = "default_fallback_interval")]
    pub fallback_interval_secs: u64,
    /// Fixed wait between failed connection attempts
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,
    /// Fixed cadence in testing mode
    #[serde(default = "default_testing_interval")]
    pub testing_interval_secs: u64,
}

fn default_herd_size() -> usize {
    6
}

fn default_port() -> u16 {
    8883
}

fn default_endpoint_kind() -> String {
    "iot:Data-ATS".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_operation_timeout() -> u64 {
    5
}

fn default_draining_interval() -> u64 {
    2
}

fn default_keep_alive() -> u64 {
    60
}

fn default_trust_root_url() -> String {
    "https://www.amazontrust.com/repository/AmazonRootCA1.pem".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./certs")
}

fn default_fallback_interval() -> u64 {
    15
}

fn default_reconnect_backoff() -> u64 {
    10
}

fn default_testing_interval() -> u64 {
    15
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid client id: {0}")]
    InvalidClientId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimulatorConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulatorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field constraints that TOML parsing cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_client_id(&self.device.client_id)?;
        if self.device.herd_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "device.herd_size must be at least 1".to_string(),
            ));
        }
        if self.settings.topic_parameter.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "settings.topic_parameter must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[device]
client_id = "GPSCollar"
secret_name = "IoT/GPSThing/certs"
encoder = "position"

[sources]
secret_store_url = "http://localhost:4000"
parameter_store_url = "http://localhost:4001"
endpoint_api_url = "http://localhost:4002"

[settings]
topic_parameter = "/iot-topics/gps-topic-name"
interval_parameter = "/iot-settings/gps-publish-interval"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Client ids travel into broker session names; keep them to a safe charset.
fn validate_client_id(client_id: &str) -> Result<(), ConfigError> {
    let valid_chars = client_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if client_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidClientId(format!(
            "Client id '{client_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
