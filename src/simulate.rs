//! Mock collar data generation
//!
//! Stand-ins for real collar hardware: a random-walk herd for positional
//! fixes and a noisy-but-plausible vitals sampler. Both produce one reading
//! per collar per tick.

use crate::telemetry::{PositionFix, Reading, ReadingSource, VitalsSample};
use rand::Rng;

// Home range centered on the northern Yellowstone herd
const HOME_LAT: f64 = 44.6;
const HOME_LON: f64 = -110.5;
const SCATTER_DEG: f64 = 0.05;
const STEP_DEG: f64 = 0.0005;

const POSTURES: &[&str] = &["standing", "grazing", "walking", "bedded", "running"];

/// Herd of collars doing a bounded random walk around the home range.
pub struct HerdPositionSource {
    positions: Vec<(f64, f64)>,
}

impl HerdPositionSource {
    pub fn new(herd_size: usize) -> Self {
        let mut rng = rand::thread_rng();
        let positions = (0..herd_size)
            .map(|_| {
                (
                    HOME_LAT + rng.gen_range(-SCATTER_DEG..SCATTER_DEG),
                    HOME_LON + rng.gen_range(-SCATTER_DEG..SCATTER_DEG),
                )
            })
            .collect();
        Self { positions }
    }
}

impl ReadingSource for HerdPositionSource {
    fn next_batch(&mut self) -> Vec<Reading> {
        let mut rng = rand::thread_rng();
        self.positions
            .iter_mut()
            .map(|(lat, lon)| {
                *lat += rng.gen_range(-STEP_DEG..STEP_DEG);
                *lon += rng.gen_range(-STEP_DEG..STEP_DEG);
                // Ids are left unassigned; the encoder indexes the batch
                Reading::Position(PositionFix {
                    collar_id: None,
                    lat: *lat,
                    lon: *lon,
                })
            })
            .collect()
    }
}

/// Herd of collars reporting biometric vitals.
pub struct HerdVitalsSource {
    herd_size: usize,
}

impl HerdVitalsSource {
    pub fn new(herd_size: usize) -> Self {
        Self { herd_size }
    }
}

impl ReadingSource for HerdVitalsSource {
    fn next_batch(&mut self) -> Vec<Reading> {
        let mut rng = rand::thread_rng();
        let now = chrono::Utc::now().timestamp() as f64;
        (0..self.herd_size)
            .map(|collar_id| {
                Reading::Vitals(VitalsSample {
                    collar_id: collar_id as u32,
                    timestamp: now,
                    body_temperature: 38.0 + rng.gen_range(-0.8..0.8),
                    heart_rate: 60.0 + rng.gen_range(-15.0..25.0),
                    respiration_rate: 20.0 + rng.gen_range(-6.0..10.0),
                    activity_level: rng.gen_range(0.0..1.0),
                    posture: POSTURES[rng.gen_range(0..POSTURES.len())].to_string(),
                    hydration_level: rng.gen_range(0.5..1.0),
                    stress_level: rng.gen_range(0.0..0.6),
                })
            })
            .collect()
    }
}
