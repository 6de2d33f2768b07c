//! types/vitals.rs
//!
//! Defines the vitals reading and sample types, and the VitalsChannel type,
//! a concrete DataChannel carrying the most recent reading of a session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::DataChannel;

/// Arterial blood pressure in mmHg
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

/// A single set of vitals.
///
/// The all-zero value is the placeholder shown before the first tick of a
/// session; it is never considered critical.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsReading {
    /// Beats per minute
    pub heart_rate: u16,
    pub blood_pressure: BloodPressure,
    /// Oxygen saturation, percent
    pub spo2: u8,
}

impl VitalsReading {
    pub fn new(heart_rate: u16, systolic: u16, diastolic: u16, spo2: u8) -> Self {
        Self {
            heart_rate,
            blood_pressure: BloodPressure { systolic, diastolic },
            spo2,
        }
    }

    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl fmt::Display for VitalsReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HR {} bpm, BP {}/{} mmHg, SpO2 {}%",
            self.heart_rate, self.blood_pressure.systolic, self.blood_pressure.diastolic, self.spo2
        )
    }
}

/// A reading stamped with the time it was produced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VitalsSample {
    pub timestamp: DateTime<Utc>,
    pub reading: VitalsReading,
}

impl VitalsSample {
    pub fn new(reading: VitalsReading) -> Self {
        Self::at(reading, Utc::now())
    }

    pub fn at(reading: VitalsReading, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, reading }
    }
}

/// A type alias for DataChannel carrying the latest reading.
pub type VitalsChannel = DataChannel<VitalsReading>;
