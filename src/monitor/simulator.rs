//! Synthetic telemetry feed
//!
//! Stands in for a real device: every call draws a reading from the
//! baseline ranges and, with a configured probability, pushes one vital
//! into its critical excursion range.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::vitals::{VitalsReading, VitalsSample};

pub const HEART_RATE_RANGE: RangeInclusive<u16> = 60..=100;
pub const SYSTOLIC_RANGE: RangeInclusive<u16> = 110..=140;
pub const DIASTOLIC_RANGE: RangeInclusive<u16> = 70..=90;
pub const SPO2_RANGE: RangeInclusive<u8> = 95..=100;

pub const LOW_HEART_RATE_EXCURSION: RangeInclusive<u16> = 40..=49;
pub const HIGH_HEART_RATE_EXCURSION: RangeInclusive<u16> = 131..=160;
pub const SYSTOLIC_EXCURSION: RangeInclusive<u16> = 181..=200;
pub const DIASTOLIC_EXCURSION: RangeInclusive<u16> = 121..=130;
pub const SPO2_EXCURSION: RangeInclusive<u8> = 85..=89;

pub const DEFAULT_SPIKE_PROBABILITY: f64 = 0.05;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
    /// Chance per tick that one vital leaves its baseline range
    pub spike_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            spike_probability: DEFAULT_SPIKE_PROBABILITY,
        }
    }
}

pub struct TelemetrySimulator {
    rng: StdRng,
    spike_probability: f64,
}

impl TelemetrySimulator {
    pub fn new(config: &SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let spike_probability = if config.spike_probability.is_finite() {
            config.spike_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self { rng, spike_probability }
    }

    pub fn next_reading(&mut self) -> VitalsReading {
        let mut reading = VitalsReading::new(
            self.rng.gen_range(HEART_RATE_RANGE),
            self.rng.gen_range(SYSTOLIC_RANGE),
            self.rng.gen_range(DIASTOLIC_RANGE),
            self.rng.gen_range(SPO2_RANGE),
        );

        if self.rng.gen_bool(self.spike_probability) {
            self.apply_excursion(&mut reading);
        }
        reading
    }

    pub fn next_sample(&mut self) -> VitalsSample {
        VitalsSample::new(self.next_reading())
    }

    fn apply_excursion(&mut self, reading: &mut VitalsReading) {
        match self.rng.gen_range(0..4) {
            0 => {
                reading.heart_rate = if self.rng.gen_bool(0.5) {
                    self.rng.gen_range(LOW_HEART_RATE_EXCURSION)
                } else {
                    self.rng.gen_range(HIGH_HEART_RATE_EXCURSION)
                };
            }
            1 => reading.blood_pressure.systolic = self.rng.gen_range(SYSTOLIC_EXCURSION),
            2 => reading.blood_pressure.diastolic = self.rng.gen_range(DIASTOLIC_EXCURSION),
            _ => reading.spo2 = self.rng.gen_range(SPO2_EXCURSION),
        }
    }
}
