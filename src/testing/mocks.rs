//! Mock implementations for testing
//!
//! Scriptable stand-ins for the secret store, parameter store, endpoint
//! resolver, transport connector/session, and clock. Failure behavior is
//! scripted per call so tests can walk the publish loop through exact
//! reconnect scenarios without a broker or real delays.

use crate::clock::Clock;
use crate::error::{ConnectError, PublishError, SourceError};
use crate::sources::{EndpointResolver, ParameterStore, SecretStore};
use crate::telemetry::{Reading, ReadingSource};
use crate::transport::{Connector, Session};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn mock_source_error(message: &str) -> SourceError {
    SourceError::Malformed {
        name: "mock".to_string(),
        value: message.to_string(),
    }
}

/// Mock secret store holding one secret value.
#[derive(Debug, Default)]
pub struct MockSecretStore {
    secrets: Mutex<HashMap<String, String>>,
    should_fail: bool,
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, name: &str, value: &str) -> Self {
        self.secrets
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn fetch_secret(&self, name: &str) -> Result<String, SourceError> {
        if self.should_fail {
            return Err(mock_source_error("scripted secret store failure"));
        }
        self.secrets
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::MissingField("value".to_string()))
    }
}

/// Mock parameter store with mutable values, so tests can change a setting
/// between loop ticks.
#[derive(Debug, Default)]
pub struct MockParameterStore {
    parameters: Mutex<HashMap<String, String>>,
    should_fail: bool,
    fetch_count: AtomicU32,
}

impl MockParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(self, name: &str, value: &str) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn set_parameter(&self, name: &str, value: &str) {
        self.parameters
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterStore for MockParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(mock_source_error("scripted parameter store failure"));
        }
        self.parameters
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::MissingField("value".to_string()))
    }
}

/// Mock endpoint resolver returning a fixed address.
#[derive(Debug)]
pub struct MockEndpointResolver {
    address: String,
    should_fail: bool,
}

impl MockEndpointResolver {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            address: String::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl EndpointResolver for MockEndpointResolver {
    async fn resolve(&self, _kind: &str) -> Result<String, SourceError> {
        if self.should_fail {
            return Err(mock_source_error("scripted endpoint lookup failure"));
        }
        Ok(self.address.clone())
    }
}

/// One recorded publish attempt: which session made it, where, what, and
/// whether it succeeded.
#[derive(Debug, Clone)]
pub struct PublishRecord {
    pub session_id: u32,
    pub topic: String,
    pub payload: Vec<u8>,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct ConnectorScript {
    connect_failures: Mutex<VecDeque<String>>,
    publish_failures: Mutex<VecDeque<String>>,
    records: Mutex<Vec<PublishRecord>>,
    connect_attempts: AtomicU32,
    sessions_created: AtomicU32,
}

/// Mock connector producing [`MockSession`]s. Connect and publish failures
/// are scripted as front-loaded queues: each call consumes one entry, and an
/// empty queue means success.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    script: Arc<ConnectorScript>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a connect failure; consumed in order before successes resume.
    pub fn fail_next_connect(&self, reason: &str) {
        self.script
            .connect_failures
            .lock()
            .unwrap()
            .push_back(reason.to_string());
    }

    /// Queue a publish failure for whichever session publishes next.
    pub fn fail_next_publish(&self, reason: &str) {
        self.script
            .publish_failures
            .lock()
            .unwrap()
            .push_back(reason.to_string());
    }

    pub fn connect_attempts(&self) -> u32 {
        self.script.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn sessions_created(&self) -> u32 {
        self.script.sessions_created.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<PublishRecord> {
        self.script.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self) -> Result<MockSession, ConnectError> {
        self.script.connect_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.script.connect_failures.lock().unwrap().pop_front() {
            return Err(ConnectError::Handshake(reason));
        }
        let id = self.script.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockSession {
            id,
            script: self.script.clone(),
            broken: false,
        })
    }
}

/// Session handle produced by [`MockConnector`]. Carries a unique id so tests
/// can prove a discarded handle was never reused.
#[derive(Debug)]
pub struct MockSession {
    id: u32,
    script: Arc<ConnectorScript>,
    broken: bool,
}

impl MockSession {
    pub fn id(&self) -> u32 {
        self.id
    }
}

#[async_trait]
impl Session for MockSession {
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if self.broken {
            return Err(PublishError::Broken);
        }
        let failure = self.script.publish_failures.lock().unwrap().pop_front();
        let succeeded = failure.is_none();
        self.script.records.lock().unwrap().push(PublishRecord {
            session_id: self.id,
            topic: topic.to_string(),
            payload: payload.to_vec(),
            succeeded,
        });
        match failure {
            Some(reason) => {
                self.broken = true;
                Err(PublishError::ConnectionLost(reason))
            }
            None => Ok(()),
        }
    }
}

/// Clock that records sleeps and returns immediately, advancing a synthetic
/// epoch by each slept duration.
#[derive(Debug, Clone)]
pub struct TestClock {
    epoch: Arc<Mutex<f64>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl TestClock {
    pub fn new(start_epoch: f64) -> Self {
        Self {
            epoch: Arc::new(Mutex::new(start_epoch)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new(1_700_000_000.0)
    }
}

#[async_trait]
impl Clock for TestClock {
    fn epoch(&self) -> f64 {
        *self.epoch.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.epoch.lock().unwrap() += duration.as_secs_f64();
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Reading source that replays the same fixed batch every tick.
#[derive(Debug, Clone)]
pub struct FixedReadingSource {
    batch: Vec<Reading>,
    batches_served: Arc<AtomicU32>,
}

impl FixedReadingSource {
    pub fn new(batch: Vec<Reading>) -> Self {
        Self {
            batch,
            batches_served: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn batches_served(&self) -> u32 {
        self.batches_served.load(Ordering::SeqCst)
    }
}

impl ReadingSource for FixedReadingSource {
    fn next_batch(&mut self) -> Vec<Reading> {
        self.batches_served.fetch_add(1, Ordering::SeqCst);
        self.batch.clone()
    }
}
