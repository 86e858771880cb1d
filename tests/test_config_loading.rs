//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error
//! handling. We test observable outcomes, not implementation details of TOML
//! parsing.

use collarsim::config::{ConfigError, EncoderKind, SimulatorConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
client_id = "GPSCollar"
secret_name = "IoT/GPSThing/certs"
encoder = "position"

[sources]
secret_store_url = "http://facade:4000"
parameter_store_url = "http://facade:4001"
endpoint_api_url = "http://facade:4002"

[settings]
topic_parameter = "/iot-topics/gps-topic-name"
interval_parameter = "/iot-settings/gps-publish-interval"
"#
    )
    .unwrap();

    let config = SimulatorConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.device.client_id, "GPSCollar");
    assert_eq!(config.device.secret_name, "IoT/GPSThing/certs");
    assert_eq!(config.device.encoder, EncoderKind::Position);
    assert_eq!(config.settings.topic_parameter, "/iot-topics/gps-topic-name");
}

#[test]
fn test_config_applies_documented_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
client_id = "HeaCollar"
secret_name = "IoT/HEAThing/certs"
encoder = "vitals"

[sources]
secret_store_url = "http://facade:4000"
parameter_store_url = "http://facade:4001"
endpoint_api_url = "http://facade:4002"

[settings]
topic_parameter = "/iot-topics/hea-topic-name"
interval_parameter = "/iot-settings/hea-publish-interval"
"#
    )
    .unwrap();

    let config = SimulatorConfig::load_from_file(temp_file.path()).unwrap();

    // Historical device defaults
    assert_eq!(config.mqtt.port, 8883);
    assert_eq!(config.mqtt.connect_timeout_secs, 10);
    assert_eq!(config.mqtt.operation_timeout_secs, 5);
    assert_eq!(config.mqtt.draining_interval_secs, 2);
    assert_eq!(config.settings.fallback_interval_secs, 15);
    assert_eq!(config.settings.reconnect_backoff_secs, 10);
    assert!(!config.device.testing);
    assert!(config
        .sources
        .trust_root_url
        .starts_with("https://www.amazontrust.com/"));
}

#[test]
fn test_config_rejects_invalid_client_id() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
client_id = "bad collar!"
secret_name = "IoT/GPSThing/certs"
encoder = "position"

[sources]
secret_store_url = "http://facade:4000"
parameter_store_url = "http://facade:4001"
endpoint_api_url = "http://facade:4002"

[settings]
topic_parameter = "/iot-topics/gps-topic-name"
interval_parameter = "/iot-settings/gps-publish-interval"
"#
    )
    .unwrap();

    let result = SimulatorConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidClientId(_))));
}

#[test]
fn test_config_rejects_unknown_encoder() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
client_id = "GPSCollar"
secret_name = "IoT/GPSThing/certs"
encoder = "seismic"

[sources]
secret_store_url = "http://facade:4000"
parameter_store_url = "http://facade:4001"
endpoint_api_url = "http://facade:4002"

[settings]
topic_parameter = "/iot-topics/gps-topic-name"
interval_parameter = "/iot-settings/gps-publish-interval"
"#
    )
    .unwrap();

    let result = SimulatorConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_missing_file() {
    let result =
        SimulatorConfig::load_from_file(std::path::Path::new("/nonexistent/collarsim.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_config_missing_required_section() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
client_id = "GPSCollar"
secret_name = "IoT/GPSThing/certs"
encoder = "position"
"#
    )
    .unwrap();

    let result = SimulatorConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}
