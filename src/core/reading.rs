//! Synthetic crane sensor reading.
//!
//! A `Reading` is drawn fresh on every loop iteration: six independent
//! uniform samples, one per field, each from its own half-open range. It is
//! serialized to a flat JSON object and then dropped.

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Load on the hook, kg.
pub const WEIGHT_RANGE: Range<f64> = 100.0..1000.0;
/// Wind at the boom tip, m/s.
pub const WIND_SPEED_RANGE: Range<f64> = 0.0..20.0;
/// Stability margin, percent.
pub const STABILITY_RANGE: Range<f64> = 50.0..100.0;
/// Boom elevation, degrees.
pub const BOOM_ANGLE_RANGE: Range<f64> = 0.0..90.0;
/// Slewing rate, degrees per second.
pub const SWING_SPEED_RANGE: Range<f64> = 0.0..5.0;
/// Power draw, kW.
pub const ENERGY_CONSUMPTION_RANGE: Range<f64> = 10.0..100.0;

/// Wire name and range of every field, in payload order.
pub const FIELD_RANGES: [(&str, Range<f64>); 6] = [
    ("weight", WEIGHT_RANGE),
    ("windSpeed", WIND_SPEED_RANGE),
    ("stability", STABILITY_RANGE),
    ("boomAngle", BOOM_ANGLE_RANGE),
    ("swingSpeed", SWING_SPEED_RANGE),
    ("energyConsumption", ENERGY_CONSUMPTION_RANGE),
];

/// One set of sensor values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Reading {
    pub weight: f64,
    pub wind_speed: f64,
    pub stability: f64,
    pub boom_angle: f64,
    pub swing_speed: f64,
    pub energy_consumption: f64,
}

impl Reading {
    /// Draws a reading from `rng`, one uniform sample per field.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            weight: rng.gen_range(WEIGHT_RANGE),
            wind_speed: rng.gen_range(WIND_SPEED_RANGE),
            stability: rng.gen_range(STABILITY_RANGE),
            boom_angle: rng.gen_range(BOOM_ANGLE_RANGE),
            swing_speed: rng.gen_range(SWING_SPEED_RANGE),
            energy_consumption: rng.gen_range(ENERGY_CONSUMPTION_RANGE),
        }
    }

    /// Draws a reading from the thread-local generator.
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    /// Field values in `FIELD_RANGES` order.
    pub fn values(&self) -> [f64; 6] {
        [
            self.weight,
            self.wind_speed,
            self.stability,
            self.boom_angle,
            self.swing_speed,
            self.energy_consumption,
        ]
    }

    pub fn is_within_bounds(&self) -> bool {
        FIELD_RANGES
            .iter()
            .zip(self.values())
            .all(|((_, range), value)| range.contains(&value))
    }

    /// Encodes the reading as the UTF-8 JSON wire payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a wire payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}
