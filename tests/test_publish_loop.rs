//! End-to-end publish loop tests over the mock transport
//!
//! These exercise full device behavior through the public API: envelope
//! shape on the wire, cadence adjustments taking effect between ticks,
//! fallback when the parameter store misbehaves, and recovery across
//! repeated connection failures.

use collarsim::cadence::CadenceController;
use collarsim::publisher::{LoopOptions, PublishLoop};
use collarsim::telemetry::{
    PositionEncoder, PositionFix, Reading, VitalsEncoder, VitalsSample, VitalsSchema,
};
use collarsim::testing::mocks::{
    FixedReadingSource, MockConnector, MockParameterStore, TestClock,
};
use std::sync::Arc;
use std::time::Duration;

const INTERVAL_PARAMETER: &str = "/iot-settings/gps-publish-interval";

fn gps_batch() -> Vec<Reading> {
    vec![
        Reading::Position(PositionFix {
            collar_id: None,
            lat: 44.61234,
            lon: -110.49876,
        }),
        Reading::Position(PositionFix {
            collar_id: None,
            lat: 44.60002,
            lon: -110.51111,
        }),
    ]
}

fn vitals_batch() -> Vec<Reading> {
    vec![Reading::Vitals(VitalsSample {
        collar_id: 7,
        timestamp: 1_700_000_123.456789,
        body_temperature: 38.123456,
        heart_rate: 62.0,
        respiration_rate: 19.999999,
        activity_level: 0.25,
        posture: "grazing".to_string(),
        hydration_level: 0.87654321,
        stress_level: 0.1,
    })]
}

fn options() -> LoopOptions {
    LoopOptions {
        reconnect_backoff: Duration::from_secs(10),
        testing: false,
        testing_interval: Duration::from_secs(15),
    }
}

#[tokio::test]
async fn test_wire_envelope_carries_topic_timestamp_and_records() {
    let connector = MockConnector::new();
    let clock = TestClock::new(1_700_000_000.0);
    let store = Arc::new(MockParameterStore::new().with_parameter(INTERVAL_PARAMETER, "15"));
    let cadence = CadenceController::new(store, INTERVAL_PARAMETER, 15);
    let mut publish_loop = PublishLoop::new(
        connector.clone(),
        Box::new(PositionEncoder::new("elk/gps")),
        Box::new(FixedReadingSource::new(gps_batch())),
        cadence,
        Arc::new(clock),
        "elk/gps",
        options(),
    );

    publish_loop.run_ticks(Some(1)).await.unwrap();

    let records = connector.records();
    assert_eq!(records.len(), 1);
    let envelope: serde_json::Value = serde_json::from_slice(&records[0].payload).unwrap();

    assert_eq!(envelope["topic"], "elk/gps");
    assert_eq!(envelope["timestamp"], 1_700_000_000.0);
    assert!(envelope["messageId"].as_str().is_some());
    let batch = envelope["payload"].as_array().unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0]["elk_id"], 0);
    assert_eq!(batch[0]["lat"], 44.61234);
    assert_eq!(batch[1]["elk_id"], 1);
    assert_eq!(batch[1]["lon"], -110.51111);
}

#[tokio::test]
async fn test_vitals_envelope_rounds_floats_on_the_wire() {
    let connector = MockConnector::new();
    let store = Arc::new(MockParameterStore::new().with_parameter(INTERVAL_PARAMETER, "15"));
    let cadence = CadenceController::new(store, INTERVAL_PARAMETER, 15);
    let mut publish_loop = PublishLoop::new(
        connector.clone(),
        Box::new(VitalsEncoder::new("elk/vitals", VitalsSchema::default())),
        Box::new(FixedReadingSource::new(vitals_batch())),
        cadence,
        Arc::new(TestClock::default()),
        "elk/vitals",
        options(),
    );

    publish_loop.run_ticks(Some(1)).await.unwrap();

    let records = connector.records();
    let envelope: serde_json::Value = serde_json::from_slice(&records[0].payload).unwrap();
    let record = &envelope["payload"][0];

    assert_eq!(record["sensor_id"], 0);
    assert_eq!(record["elk_id"], 7);
    assert_eq!(record["body_temperature"], 38.12346);
    assert_eq!(record["respiration_rate"], 20.0);
    assert_eq!(record["hydration_level"], 0.87654);
    assert_eq!(record["posture"], "grazing");
}

#[tokio::test]
async fn test_interval_change_applies_on_next_tick() {
    let connector = MockConnector::new();
    let clock = TestClock::default();
    let store = Arc::new(MockParameterStore::new().with_parameter(INTERVAL_PARAMETER, "15"));
    let cadence = CadenceController::new(store.clone(), INTERVAL_PARAMETER, 15);
    let mut publish_loop = PublishLoop::new(
        connector,
        Box::new(PositionEncoder::new("elk/gps")),
        Box::new(FixedReadingSource::new(gps_batch())),
        cadence,
        Arc::new(clock.clone()),
        "elk/gps",
        options(),
    );

    publish_loop.run_ticks(Some(2)).await.unwrap();
    store.set_parameter(INTERVAL_PARAMETER, "60");
    publish_loop.run_ticks(Some(2)).await.unwrap();

    // The interval is re-read before every sleep, no restart needed
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(15), Duration::from_secs(60)]
    );
}

#[tokio::test]
async fn test_unreadable_interval_falls_back_without_stalling() {
    let connector = MockConnector::new();
    let clock = TestClock::default();
    let store = Arc::new(MockParameterStore::failing());
    let cadence = CadenceController::new(store, INTERVAL_PARAMETER, 15);
    let mut publish_loop = PublishLoop::new(
        connector.clone(),
        Box::new(PositionEncoder::new("elk/gps")),
        Box::new(FixedReadingSource::new(gps_batch())),
        cadence,
        Arc::new(clock.clone()),
        "elk/gps",
        options(),
    );

    publish_loop.run_ticks(Some(2)).await.unwrap();

    assert_eq!(connector.records().len(), 2);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(15)]);
}

#[tokio::test]
async fn test_recovers_after_repeated_connect_failures() {
    let connector = MockConnector::new();
    connector.fail_next_connect("dns lookup failed");
    connector.fail_next_connect("tls handshake refused");
    connector.fail_next_connect("connack timeout");
    let clock = TestClock::default();
    let store = Arc::new(MockParameterStore::new().with_parameter(INTERVAL_PARAMETER, "15"));
    let cadence = CadenceController::new(store, INTERVAL_PARAMETER, 15);
    let mut publish_loop = PublishLoop::new(
        connector.clone(),
        Box::new(PositionEncoder::new("elk/gps")),
        Box::new(FixedReadingSource::new(gps_batch())),
        cadence,
        Arc::new(clock.clone()),
        "elk/gps",
        options(),
    );

    publish_loop.run_ticks(Some(1)).await.unwrap();

    // Three failures, each followed by the same fixed backoff, then success
    assert_eq!(connector.connect_attempts(), 4);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(10),
        ]
    );
    assert_eq!(connector.records().len(), 1);
    assert!(connector.records()[0].succeeded);
}

#[tokio::test]
async fn test_publish_failure_mid_run_resumes_on_fresh_session() {
    let connector = MockConnector::new();
    let store = Arc::new(MockParameterStore::new().with_parameter(INTERVAL_PARAMETER, "15"));
    let cadence = CadenceController::new(store, INTERVAL_PARAMETER, 15);
    let mut publish_loop = PublishLoop::new(
        connector.clone(),
        Box::new(PositionEncoder::new("elk/gps")),
        Box::new(FixedReadingSource::new(gps_batch())),
        cadence,
        Arc::new(TestClock::default()),
        "elk/gps",
        options(),
    );

    publish_loop.run_ticks(Some(2)).await.unwrap();
    connector.fail_next_publish("broker closed connection");
    publish_loop.run_ticks(Some(2)).await.unwrap();

    let records = connector.records();
    // Each run starts with a fresh connection; the failure burns session 2
    // and the remaining ticks complete on session 3
    assert_eq!(records.len(), 5);
    assert!(records[0..2].iter().all(|r| r.succeeded && r.session_id == 1));
    assert!(!records[2].succeeded);
    assert_eq!(records[2].session_id, 2);
    assert!(records[3..].iter().all(|r| r.succeeded && r.session_id == 3));
    assert_eq!(connector.sessions_created(), 3);
}
