//! The publish loop
//!
//! Top-level driver for the device: build a payload, publish it at QoS 1,
//! sleep for the externally controlled interval, repeat forever. Connection
//! failures are retried with a fixed backoff and no attempt cap — the device
//! has no operator to escalate to. A session that failed a publish is
//! discarded and a fresh one (with fresh credentials) is established before
//! the next attempt.
//!
//! Encoder failures are the one exception to "never exit": they indicate a
//! defect, not a runtime condition, and surface out of `run`.

use crate::cadence::CadenceController;
use crate::clock::Clock;
use crate::error::SimulatorResult;
use crate::observability::LogMirror;
use crate::telemetry::{Encoder, ReadingSource, TelemetryPayload};
use crate::transport::{Connector, Session};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Loop states. There is no terminal state reachable from normal operation;
/// the loop runs until the process is killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    AwaitingConnection,
    Publishing,
    Sleeping,
}

/// Timing and mode knobs, lifted from `[settings]` and `[device]`.
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Fixed wait between failed connection attempts
    pub reconnect_backoff: Duration,
    /// Testing mode: build payloads, never touch the network
    pub testing: bool,
    /// Fixed cadence while in testing mode
    pub testing_interval: Duration,
}

pub struct PublishLoop<C: Connector> {
    connector: C,
    encoder: Box<dyn Encoder>,
    source: Box<dyn ReadingSource>,
    cadence: CadenceController,
    clock: Arc<dyn Clock>,
    mirror: Option<LogMirror>,
    topic: String,
    options: LoopOptions,
    state: LoopState,
    last_payload: Option<TelemetryPayload>,
}

impl<C: Connector> PublishLoop<C> {
    pub fn new(
        connector: C,
        encoder: Box<dyn Encoder>,
        source: Box<dyn ReadingSource>,
        cadence: CadenceController,
        clock: Arc<dyn Clock>,
        topic: impl Into<String>,
        options: LoopOptions,
    ) -> Self {
        Self {
            connector,
            encoder,
            source,
            cadence,
            clock,
            mirror: None,
            topic: topic.into(),
            options,
            state: LoopState::Initializing,
            last_payload: None,
        }
    }

    pub fn with_mirror(mut self, mirror: LogMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Payload built by the most recent testing-mode tick. Production ticks
    /// never retain a payload past its publish attempt.
    pub fn last_payload(&self) -> Option<&TelemetryPayload> {
        self.last_payload.as_ref()
    }

    /// Run forever (until the process is killed).
    pub async fn run(&mut self) -> SimulatorResult<()> {
        self.run_ticks(None).await
    }

    /// Run for at most `limit` successful ticks. `None` means forever; a
    /// bound lets tests drive the state machine to completion.
    pub async fn run_ticks(&mut self, limit: Option<u64>) -> SimulatorResult<()> {
        if self.options.testing {
            return self.run_testing(limit).await;
        }

        let mut ticks = 0u64;
        let mut session: Option<C::Session> = None;
        loop {
            let mut live = match session.take() {
                Some(live) => live,
                None => self.await_connection().await,
            };

            self.transition(LoopState::Publishing);
            let readings = self.source.next_batch();
            let payload = self.encoder.encode(&readings, self.clock.epoch())?;
            let bytes = Bytes::from(payload.to_bytes()?);
            let message_id = payload.message_id;
            let record_count = payload.records.len();
            // The payload is not retained past this attempt, success or not
            drop(payload);

            match live.publish(&self.topic, bytes).await {
                Ok(()) => {
                    info!(
                        message_id = %message_id,
                        topic = %self.topic,
                        records = record_count,
                        "published telemetry"
                    );
                    self.mirror(format!("Published {message_id} to {}", self.topic));

                    ticks += 1;
                    if let Some(limit) = limit {
                        if ticks >= limit {
                            return Ok(());
                        }
                    }

                    self.transition(LoopState::Sleeping);
                    let interval = self.cadence.current_interval().await;
                    debug!(interval_secs = interval, "sleeping until next tick");
                    self.clock.sleep(Duration::from_secs(interval)).await;
                    session = Some(live);
                }
                Err(e) => {
                    error!(error = %e, topic = %self.topic, "publish failed, rebuilding connection");
                    self.mirror(format!("Publish failed: {e}. Retrying connection..."));
                    // The handle is presumed broken; drop it without a close
                    drop(live);
                    session = None;
                }
            }
        }
    }

    /// Retry connecting forever with the fixed backoff.
    async fn await_connection(&mut self) -> C::Session {
        self.transition(LoopState::AwaitingConnection);
        loop {
            info!("attempting broker connection");
            match self.connector.connect().await {
                Ok(session) => {
                    info!("broker connection established");
                    self.mirror("Connected to broker");
                    return session;
                }
                Err(e) => {
                    error!(
                        stage = e.stage(),
                        error = %e,
                        backoff_secs = self.options.reconnect_backoff.as_secs(),
                        "connection failed, retrying"
                    );
                    self.mirror(format!("Connection failed: {e}. Retrying..."));
                    self.clock.sleep(self.options.reconnect_backoff).await;
                }
            }
        }
    }

    /// Testing mode: exercise payload construction only, on a fixed cadence.
    /// Payloads are identical in shape to production ones but never leave the
    /// process.
    async fn run_testing(&mut self, limit: Option<u64>) -> SimulatorResult<()> {
        info!("testing mode: payloads will be constructed but not published");
        let mut ticks = 0u64;
        loop {
            self.transition(LoopState::Publishing);
            let readings = self.source.next_batch();
            let payload = self.encoder.encode(&readings, self.clock.epoch())?;
            info!(
                message_id = %payload.message_id,
                records = payload.records.len(),
                "payload constructed (testing mode, not published)"
            );
            self.last_payload = Some(payload);

            ticks += 1;
            if let Some(limit) = limit {
                if ticks >= limit {
                    return Ok(());
                }
            }

            self.transition(LoopState::Sleeping);
            self.clock.sleep(self.options.testing_interval).await;
        }
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "loop state transition");
            self.state = next;
        }
    }

    fn mirror(&self, message: impl Into<String>) {
        if let Some(mirror) = &self.mirror {
            mirror.record(message);
        }
    }
}
