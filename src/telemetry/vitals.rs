//! Vitals telemetry encoder
//!
//! The upstream producer's wire schema was unstable about which numeric fields
//! arrived wrapped versus flat, so the shape of every field is declared in a
//! schema instead of hard-coded: `Float` fields are rounded to 5 decimal
//! places and emitted as plain numbers, `Integer` and `Text` fields pass
//! through untouched.

use super::{round5, Encoder, Reading, TelemetryPayload};
use crate::error::EncodeError;
use serde::ser::Error as _;
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Declared wire shape of one vitals field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape {
    /// Plain number, rounded to 5 decimal places
    Float,
    /// Plain integer, passed through
    Integer,
    /// String, passed through
    Text,
}

/// Ordered field list with declared shapes. Fields absent from a sample are
/// skipped; fields absent from the schema are never emitted.
#[derive(Debug, Clone)]
pub struct VitalsSchema {
    fields: Vec<(&'static str, FieldShape)>,
}

impl Default for VitalsSchema {
    fn default() -> Self {
        Self {
            fields: vec![
                ("elk_id", FieldShape::Integer),
                ("timestamp", FieldShape::Float),
                ("body_temperature", FieldShape::Float),
                ("heart_rate", FieldShape::Float),
                ("respiration_rate", FieldShape::Float),
                ("activity_level", FieldShape::Float),
                ("posture", FieldShape::Text),
                ("hydration_level", FieldShape::Float),
                ("stress_level", FieldShape::Float),
            ],
        }
    }
}

impl VitalsSchema {
    pub fn new(fields: Vec<(&'static str, FieldShape)>) -> Self {
        Self { fields }
    }

    fn apply(&self, source: &Map<String, Value>, sensor_id: usize) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("sensor_id".to_string(), json!(sensor_id));
        for (name, shape) in &self.fields {
            let Some(value) = source.get(*name) else {
                continue;
            };
            let shaped = match shape {
                FieldShape::Float => match value.as_f64() {
                    Some(raw) => json!(round5(raw)),
                    None => value.clone(),
                },
                FieldShape::Integer | FieldShape::Text => value.clone(),
            };
            record.insert((*name).to_string(), shaped);
        }
        record
    }
}

pub struct VitalsEncoder {
    topic: String,
    schema: VitalsSchema,
}

impl VitalsEncoder {
    pub fn new(topic: impl Into<String>, schema: VitalsSchema) -> Self {
        Self {
            topic: topic.into(),
            schema,
        }
    }
}

impl Encoder for VitalsEncoder {
    fn encode(
        &self,
        readings: &[Reading],
        timestamp: f64,
    ) -> Result<TelemetryPayload, EncodeError> {
        let mut records = Vec::with_capacity(readings.len());
        for (sensor_id, reading) in readings.iter().enumerate() {
            let sample = match reading {
                Reading::Vitals(sample) => sample,
                other => {
                    return Err(EncodeError::UnsupportedReading {
                        encoder: "vitals",
                        got: other.kind(),
                    })
                }
            };
            let source = match serde_json::to_value(sample)? {
                Value::Object(map) => map,
                other => {
                    return Err(EncodeError::Serialization(serde_json::Error::custom(
                        format!("vitals sample serialized to {other}, expected an object"),
                    )))
                }
            };
            records.push(Value::Object(self.schema.apply(&source, sensor_id)));
        }

        Ok(TelemetryPayload {
            message_id: Uuid::new_v4(),
            topic: self.topic.clone(),
            timestamp,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::VitalsSample;
    use proptest::prelude::*;

    fn sample(collar_id: u32) -> VitalsSample {
        VitalsSample {
            collar_id,
            timestamp: 1700000000.0,
            body_temperature: 38.123456789,
            heart_rate: 61.999999,
            respiration_rate: 20.0000051,
            activity_level: 0.7654321,
            posture: "grazing".to_string(),
            hydration_level: 0.8111119,
            stress_level: 0.123456,
        }
    }

    fn encode_one(sample: VitalsSample) -> Value {
        let encoder = VitalsEncoder::new("elk/hea", VitalsSchema::default());
        let payload = encoder
            .encode(&[Reading::Vitals(sample)], 1700000001.0)
            .unwrap();
        payload.records[0].clone()
    }

    #[test]
    fn test_floats_rounded_to_5_places() {
        let record = encode_one(sample(3));
        assert_eq!(record["body_temperature"], serde_json::json!(38.12346));
        assert_eq!(record["heart_rate"], serde_json::json!(62.0));
        assert_eq!(record["respiration_rate"], serde_json::json!(20.00001));
        assert_eq!(record["stress_level"], serde_json::json!(0.12346));
    }

    #[test]
    fn test_text_and_integer_pass_through() {
        let record = encode_one(sample(3));
        assert_eq!(record["posture"], serde_json::json!("grazing"));
        assert_eq!(record["elk_id"], serde_json::json!(3));
    }

    #[test]
    fn test_sensor_id_is_batch_index() {
        let encoder = VitalsEncoder::new("elk/hea", VitalsSchema::default());
        let readings = vec![
            Reading::Vitals(sample(7)),
            Reading::Vitals(sample(8)),
            Reading::Vitals(sample(9)),
        ];
        let payload = encoder.encode(&readings, 0.0).unwrap();
        for (i, record) in payload.records.iter().enumerate() {
            assert_eq!(record["sensor_id"], serde_json::json!(i));
        }
    }

    #[test]
    fn test_custom_schema_controls_shape() {
        let schema = VitalsSchema::new(vec![
            ("elk_id", FieldShape::Integer),
            ("heart_rate", FieldShape::Float),
            ("posture", FieldShape::Text),
        ]);
        let encoder = VitalsEncoder::new("elk/hea", schema);
        let payload = encoder
            .encode(&[Reading::Vitals(sample(1))], 0.0)
            .unwrap();
        let record = &payload.records[0];
        assert_eq!(record["heart_rate"], serde_json::json!(62.0));
        // Fields outside the schema never appear
        assert!(record.get("body_temperature").is_none());
    }

    #[test]
    fn test_rejects_position_reading() {
        let encoder = VitalsEncoder::new("elk/hea", VitalsSchema::default());
        let readings = vec![Reading::Position(crate::telemetry::PositionFix {
            collar_id: None,
            lat: 0.0,
            lon: 0.0,
        })];
        assert!(matches!(
            encoder.encode(&readings, 0.0),
            Err(EncodeError::UnsupportedReading {
                encoder: "vitals",
                got: "position"
            })
        ));
    }

    proptest! {
        // Every rounded float lands within 5e-6 of the source and carries no
        // more than 5 decimal digits.
        #[test]
        fn prop_rounding_bounds(raw in -1000.0f64..1000.0) {
            let mut s = sample(0);
            s.body_temperature = raw;
            let record = encode_one(s);
            let encoded = record["body_temperature"].as_f64().unwrap();
            prop_assert!((encoded - raw).abs() <= 5e-6 + 1e-9);
            let scaled = encoded * 100_000.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-4);
        }
    }
}
