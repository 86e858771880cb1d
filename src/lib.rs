//! collarsim - mock IoT collar telemetry publisher
//!
//! Simulates a fleet of tracking collars publishing telemetry over TLS MQTT.
//! The device provisions X.509 credentials from a remote secret store on every
//! connection attempt, resolves the broker endpoint fresh, and runs an
//! indefinite publish loop with reconnect-on-failure semantics and an
//! externally adjustable publish cadence.
//!
//! # Overview
//!
//! - [`credentials`] - trust-root download, combined-PEM secret parsing, and
//!   artifact materialization for the TLS layer
//! - [`transport`] - the connector/session seam and its rumqttc implementation
//! - [`cadence`] - per-tick publish interval fetch with a local fallback
//! - [`publisher`] - the publish loop state machine
//! - [`telemetry`] - pluggable encoders (positional fixes, biometric vitals)
//! - [`simulate`] - mock collar data generators
//! - [`sources`] - trait seams for the secret store, parameter store, and
//!   broker endpoint lookup

pub mod cadence;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod observability;
pub mod publisher;
pub mod simulate;
pub mod sources;
pub mod telemetry;
pub mod testing;
pub mod transport;

pub use cadence::CadenceController;
pub use clock::{Clock, SystemClock};
pub use config::{EncoderKind, SimulatorConfig};
pub use credentials::{CredentialBundle, CredentialProvisioner};
pub use error::{
    ConnectError, EncodeError, ProvisionError, PublishError, SimulatorError, SimulatorResult,
    SourceError,
};
pub use publisher::{LoopOptions, LoopState, PublishLoop};
pub use telemetry::{Encoder, Reading, ReadingSource, TelemetryPayload};
pub use transport::{Connector, MqttConnector, Session};
