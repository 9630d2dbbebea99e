//! Random sensor readings.

use rand::Rng;
use serde::Serialize;

/// Base coordinates the simulated vehicles drive around.
const BASE_LAT: f64 = 12.34;
const BASE_LON: f64 = 56.78;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gps {
    pub lat: f64,
    pub lon: f64,
}

/// One reading as submitted to `/api/alert/process-sensor-data`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorData {
    /// km/h.
    pub speed: f64,
    /// m/s².
    pub acceleration: f64,
    pub gps: Gps,
    /// Metres to the nearest obstacle.
    pub obstacle_distance: f64,
}

impl SensorData {
    /// Draw a reading from `rng`.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            speed: rng.gen_range(0.0..=120.0),
            acceleration: rng.gen_range(-5.0..=5.0),
            gps: Gps {
                lat: BASE_LAT + rng.gen_range(0.0..0.01),
                lon: BASE_LON + rng.gen_range(0.0..0.01),
            },
            obstacle_distance: rng.gen_range(0.0..=200.0),
        }
    }
}
