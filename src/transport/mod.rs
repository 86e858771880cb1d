//! Transport layer for telemetry publishing
//!
//! The publish loop only sees these two traits: a [`Connector`] that
//! establishes authenticated sessions and a [`Session`] that can publish.
//! The MQTT implementation lives in [`mqtt`]; mocks for testing live in
//! `crate::testing::mocks`.

use crate::error::{ConnectError, PublishError};
use async_trait::async_trait;
use bytes::Bytes;

pub mod mqtt;

pub use mqtt::{MqttConnector, MqttSession, SessionState};

/// A live, publish-capable session. At most one exists at a time; once a
/// publish fails the handle must be discarded, never reused.
#[async_trait]
pub trait Session: Send {
    /// Publish at QoS 1 ("at least once") and wait for the acknowledgment.
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError>;
}

/// Establishes sessions. Never retries internally — the publish loop owns the
/// retry policy.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    async fn connect(&self) -> Result<Self::Session, ConnectError>;
}
