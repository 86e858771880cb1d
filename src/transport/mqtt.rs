//! MQTT connection manager and session handle
//!
//! `connect()` performs the full provisioning sequence for every attempt:
//! resolve the broker endpoint, fetch fresh credentials, configure a TLS
//! client, and drive the event loop until the broker confirms the handshake.
//! Nothing is cached across attempts; a reconnect always sees current
//! credentials and a freshly resolved endpoint.

use crate::config::MqttSection;
use crate::credentials::CredentialProvisioner;
use crate::error::{ConnectError, PublishError};
use crate::sources::EndpointResolver;
use crate::transport::{Connector, Session};
use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration,
    Transport as MqttTransport,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Request queue depth while offline. The device publishes one message per
/// tick, so this is effectively unbounded.
const OFFLINE_QUEUE_CAPACITY: usize = 10_000;

/// Lifecycle of one session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Broken,
}

pub struct MqttConnector {
    client_id: String,
    mqtt: MqttSection,
    resolver: Arc<dyn EndpointResolver>,
    provisioner: CredentialProvisioner,
}

impl MqttConnector {
    pub fn new(
        client_id: impl Into<String>,
        mqtt: MqttSection,
        resolver: Arc<dyn EndpointResolver>,
        provisioner: CredentialProvisioner,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            mqtt,
            resolver,
            provisioner,
        }
    }
}

#[async_trait]
impl Connector for MqttConnector {
    type Session = MqttSession;

    async fn connect(&self) -> Result<MqttSession, ConnectError> {
        // Endpoint is resolved fresh on every attempt, never cached
        let endpoint = self
            .resolver
            .resolve(&self.mqtt.endpoint_kind)
            .await
            .map_err(ConnectError::Endpoint)?;
        debug!(endpoint = %endpoint, "broker endpoint resolved");

        let (bundle, _artifacts) = self.provisioner.provision().await?;

        let mut options = MqttOptions::new(&self.client_id, &endpoint, self.mqtt.port);
        options.set_keep_alive(Duration::from_secs(self.mqtt.keep_alive_secs));
        options.set_pending_throttle(Duration::from_secs(self.mqtt.draining_interval_secs));
        options.set_transport(MqttTransport::Tls(TlsConfiguration::Simple {
            ca: bundle.trust_root,
            alpn: None,
            client_auth: Some((
                bundle.certificate.into_bytes(),
                bundle.private_key.into_bytes(),
            )),
        }));

        let (client, event_loop) = AsyncClient::new(options, OFFLINE_QUEUE_CAPACITY);
        let mut session = MqttSession {
            client,
            event_loop,
            state: SessionState::Connecting,
            operation_timeout_secs: self.mqtt.operation_timeout_secs,
            broker: endpoint,
        };
        session
            .await_connack(Duration::from_secs(self.mqtt.connect_timeout_secs))
            .await?;

        info!(broker = %session.broker, client_id = %self.client_id, "connected to broker");
        Ok(session)
    }
}

/// A live TLS MQTT session. Owns the client and its event loop; all polling
/// happens inline so the process stays strictly sequential.
pub struct MqttSession {
    client: AsyncClient,
    event_loop: EventLoop,
    state: SessionState,
    operation_timeout_secs: u64,
    broker: String,
}

impl MqttSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the event loop until the broker acknowledges the handshake.
    async fn await_connack(&mut self, timeout: Duration) -> Result<(), ConnectError> {
        let wait = tokio::time::timeout(timeout, async {
            loop {
                match self.event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            return Ok(());
                        }
                        return Err(ConnectError::Handshake(format!(
                            "broker refused connection: {:?}",
                            ack.code
                        )));
                    }
                    Ok(_) => continue,
                    Err(e) => return Err(ConnectError::Handshake(e.to_string())),
                }
            }
        })
        .await;

        match wait {
            Ok(Ok(())) => {
                self.state = SessionState::Connected;
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ConnectError::HandshakeTimeout(timeout.as_secs())),
        }
    }

    /// Drive the event loop until the pending publish is acknowledged.
    async fn await_puback(&mut self) -> Result<(), PublishError> {
        let timeout = Duration::from_secs(self.operation_timeout_secs);
        let wait = tokio::time::timeout(timeout, async {
            loop {
                match self.event_loop.poll().await {
                    Ok(Event::Incoming(Packet::PubAck(_))) => return Ok(()),
                    Ok(_) => continue,
                    Err(e) => return Err(PublishError::ConnectionLost(e.to_string())),
                }
            }
        })
        .await;

        match wait {
            Ok(result) => result,
            Err(_) => Err(PublishError::AckTimeout(self.operation_timeout_secs)),
        }
    }
}

#[async_trait]
impl Session for MqttSession {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if self.state == SessionState::Broken {
            return Err(PublishError::Broken);
        }

        if let Err(e) = self
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
        {
            self.state = SessionState::Broken;
            return Err(PublishError::Rejected(e.to_string()));
        }

        match self.await_puback().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(broker = %self.broker, error = %e, "session marked broken");
                self.state = SessionState::Broken;
                Err(e)
            }
        }
    }
}
