//! Error taxonomy for the telemetry publisher
//!
//! Connection-path errors carry a `stage()` label so an unattended device can
//! be diagnosed from its log lines alone.

use thiserror::Error;

/// Failures while fetching a remote secret, parameter, or endpoint lookup.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("response missing field: {0}")]
    MissingField(String),

    #[error("malformed value for {name}: {value}")]
    Malformed { name: String, value: String },
}

/// Credential provisioning failures (trust-root fetch, secret read, PEM parse,
/// artifact write).
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("trust root download failed: {0}")]
    TrustRoot(#[source] reqwest::Error),

    #[error("trust root download returned status {0}")]
    TrustRootStatus(u16),

    #[error("secret read failed: {0}")]
    Secret(#[source] SourceError),

    #[error("PEM section missing {0} markers")]
    Parse(&'static str),

    #[error("failed to write credential artifact: {0}")]
    Artifact(#[from] std::io::Error),
}

impl ProvisionError {
    /// Stage label for log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            ProvisionError::TrustRoot(_) | ProvisionError::TrustRootStatus(_) => "trust_root",
            ProvisionError::Secret(_) => "secret",
            ProvisionError::Parse(_) => "parse",
            ProvisionError::Artifact(_) => "artifact",
        }
    }
}

/// Connection establishment failures. Never retried internally; the publish
/// loop owns the retry policy.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("endpoint lookup failed: {0}")]
    Endpoint(#[source] SourceError),

    #[error("credential provisioning failed at {stage}: {0}", stage = .0.stage())]
    Provision(#[from] ProvisionError),

    #[error("broker handshake failed: {0}")]
    Handshake(String),

    #[error("no ConnAck within {0} seconds")]
    HandshakeTimeout(u64),
}

impl ConnectError {
    pub fn stage(&self) -> &'static str {
        match self {
            ConnectError::Endpoint(_) => "endpoint",
            ConnectError::Provision(e) => e.stage(),
            ConnectError::Handshake(_) | ConnectError::HandshakeTimeout(_) => "handshake",
        }
    }
}

/// Publish failures. Any of these marks the session handle broken.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish rejected by client: {0}")]
    Rejected(String),

    #[error("connection lost during publish: {0}")]
    ConnectionLost(String),

    #[error("no PubAck within {0} seconds")]
    AckTimeout(u64),

    #[error("session already marked broken")]
    Broken,
}

/// Encoder defects. Unlike the transport errors these indicate a bug, not an
/// expected runtime condition, and are allowed to surface out of the loop.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("reading kind {got} not supported by the {encoder} encoder")]
    UnsupportedReading {
        encoder: &'static str,
        got: &'static str,
    },
}

/// Umbrella error for the binary's startup and run paths.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("required setting unavailable: {0}")]
    RequiredSetting(#[source] SourceError),

    #[error("encoder defect: {0}")]
    Encode(#[from] EncodeError),
}

/// Result alias for simulator operations.
pub type SimulatorResult<T> = Result<T, SimulatorError>;
