//! Telemetry payload types and the pluggable encoder seam
//!
//! The publish loop is agnostic to the telemetry flavor; it hands a batch of
//! readings to whichever [`Encoder`] is wired in and ships the resulting
//! payload. Two realizations exist: positional fixes and biometric vitals.

use crate::error::EncodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod position;
pub mod vitals;

pub use position::PositionEncoder;
pub use vitals::{FieldShape, VitalsEncoder, VitalsSchema};

/// Wire payload for one publish. Constructed fresh per tick, immutable once
/// built, never retained after the publish attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryPayload {
    /// Unique message id, freshly generated per payload
    #[serde(rename = "messageId")]
    pub message_id: Uuid,
    /// Topic the payload is destined for
    pub topic: String,
    /// Wall-clock time in epoch seconds
    pub timestamp: f64,
    /// Encoded sensor records
    #[serde(rename = "payload")]
    pub records: Vec<Value>,
}

impl TelemetryPayload {
    /// Serialize for the transport. A failure here is an encoder defect, not
    /// a runtime condition.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// One sensor reading, variant by device flavor.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Position(PositionFix),
    Vitals(VitalsSample),
}

impl Reading {
    pub fn kind(&self) -> &'static str {
        match self {
            Reading::Position(_) => "position",
            Reading::Vitals(_) => "vitals",
        }
    }
}

/// A positional fix. `collar_id` may be absent; the encoder then assigns
/// sequential zero-based indices.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFix {
    pub collar_id: Option<u32>,
    pub lat: f64,
    pub lon: f64,
}

/// A biometric vitals sample.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VitalsSample {
    #[serde(rename = "elk_id")]
    pub collar_id: u32,
    pub timestamp: f64,
    pub body_temperature: f64,
    pub heart_rate: f64,
    pub respiration_rate: f64,
    pub activity_level: f64,
    pub posture: String,
    pub hydration_level: f64,
    pub stress_level: f64,
}

/// Produces the batch of readings for one tick. Production sources are the
/// mock collar generators in `crate::simulate`.
pub trait ReadingSource: Send {
    fn next_batch(&mut self) -> Vec<Reading>;
}

/// Converts a batch of readings into a wire payload.
///
/// Implementations must be pure apart from the freshly generated message id:
/// same readings and timestamp, same records.
pub trait Encoder: Send + Sync {
    fn encode(&self, readings: &[Reading], timestamp: f64) -> Result<TelemetryPayload, EncodeError>;
}

/// Round to 5 decimal places. Applied to vitals floats before encoding so the
/// transport never type-wraps raw high-precision floats downstream.
pub fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}
