//! Positional telemetry encoder
//!
//! Encodes a herd's worth of lat/lon fixes. Readings without an identifier get
//! sequential zero-based ids in batch order.

use super::{Encoder, Reading, TelemetryPayload};
use crate::error::EncodeError;
use serde_json::json;
use uuid::Uuid;

pub struct PositionEncoder {
    topic: String,
}

impl PositionEncoder {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

impl Encoder for PositionEncoder {
    fn encode(
        &self,
        readings: &[Reading],
        timestamp: f64,
    ) -> Result<TelemetryPayload, EncodeError> {
        let mut records = Vec::with_capacity(readings.len());
        for (index, reading) in readings.iter().enumerate() {
            let fix = match reading {
                Reading::Position(fix) => fix,
                other => {
                    return Err(EncodeError::UnsupportedReading {
                        encoder: "position",
                        got: other.kind(),
                    })
                }
            };
            let elk_id = fix.collar_id.unwrap_or(index as u32);
            records.push(json!({
                "elk_id": elk_id,
                "lat": fix.lat,
                "lon": fix.lon,
            }));
        }

        Ok(TelemetryPayload {
            message_id: Uuid::new_v4(),
            topic: self.topic.clone(),
            timestamp,
            records,
        })
    }
}
