//! Critical-state detection against fixed clinical thresholds

use serde::{Deserialize, Serialize};

use crate::types::vitals::VitalsReading;

/// Safe limits for each vital. A reading outside any of them is critical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Heart rate below this is bradycardic
    pub heart_rate_min: u16,
    /// Heart rate above this is tachycardic
    pub heart_rate_max: u16,
    pub systolic_max: u16,
    pub diastolic_max: u16,
    /// SpO2 below this is hypoxemic
    pub spo2_min: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heart_rate_min: 50,
            heart_rate_max: 130,
            systolic_max: 180,
            diastolic_max: 120,
            spo2_min: 90,
        }
    }
}

/// One crossed threshold, carrying the offending value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finding {
    LowHeartRate(u16),
    HighHeartRate(u16),
    HighSystolic(u16),
    HighDiastolic(u16),
    LowSpo2(u8),
}

impl Finding {
    pub fn describe(&self) -> String {
        match self {
            Finding::LowHeartRate(v) => format!("low heart rate ({} bpm)", v),
            Finding::HighHeartRate(v) => format!("high heart rate ({} bpm)", v),
            Finding::HighSystolic(v) => format!("high systolic pressure ({} mmHg)", v),
            Finding::HighDiastolic(v) => format!("high diastolic pressure ({} mmHg)", v),
            Finding::LowSpo2(v) => format!("low oxygen saturation ({}%)", v),
        }
    }
}

impl Thresholds {
    /// Every threshold the reading crosses. Empty for the placeholder reading.
    pub fn findings(&self, reading: &VitalsReading) -> Vec<Finding> {
        let mut findings = Vec::new();
        if reading.is_placeholder() {
            return findings;
        }

        if reading.heart_rate < self.heart_rate_min {
            findings.push(Finding::LowHeartRate(reading.heart_rate));
        } else if reading.heart_rate > self.heart_rate_max {
            findings.push(Finding::HighHeartRate(reading.heart_rate));
        }
        if reading.blood_pressure.systolic > self.systolic_max {
            findings.push(Finding::HighSystolic(reading.blood_pressure.systolic));
        }
        if reading.blood_pressure.diastolic > self.diastolic_max {
            findings.push(Finding::HighDiastolic(reading.blood_pressure.diastolic));
        }
        if reading.spo2 < self.spo2_min {
            findings.push(Finding::LowSpo2(reading.spo2));
        }
        findings
    }

    pub fn is_critical(&self, reading: &VitalsReading) -> bool {
        !self.findings(reading).is_empty()
    }
}

/// Classify a reading against the default clinical thresholds
pub fn is_critical(reading: &VitalsReading) -> bool {
    Thresholds::default().is_critical(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal() -> VitalsReading {
        VitalsReading::new(72, 120, 80, 98)
    }

    #[test]
    fn normal_reading_is_not_critical() {
        assert!(!is_critical(&normal()));
        assert!(Thresholds::default().findings(&normal()).is_empty());
    }

    #[test]
    fn placeholder_is_never_critical() {
        // Every field of the placeholder is out of range, but it means "no data yet"
        assert!(!is_critical(&VitalsReading::placeholder()));
    }

    #[test]
    fn heart_rate_boundaries() {
        let at = |hr| VitalsReading { heart_rate: hr, ..normal() };
        assert!(is_critical(&at(49)));
        assert!(!is_critical(&at(50)));
        assert!(!is_critical(&at(130)));
        assert!(is_critical(&at(131)));
    }

    #[test]
    fn blood_pressure_boundaries() {
        let bp = |s, d| VitalsReading::new(72, s, d, 98);
        assert!(!is_critical(&bp(180, 80)));
        assert!(is_critical(&bp(181, 80)));
        assert!(!is_critical(&bp(120, 120)));
        assert!(is_critical(&bp(120, 121)));
    }

    #[test]
    fn spo2_boundary() {
        let at = |spo2| VitalsReading { spo2, ..normal() };
        assert!(!is_critical(&at(90)));
        assert!(is_critical(&at(89)));
    }

    #[test]
    fn findings_name_every_crossed_threshold() {
        let reading = VitalsReading::new(140, 190, 125, 85);
        let findings = Thresholds::default().findings(&reading);
        assert_eq!(
            findings,
            vec![
                Finding::HighHeartRate(140),
                Finding::HighSystolic(190),
                Finding::HighDiastolic(125),
                Finding::LowSpo2(85),
            ]
        );
        assert_eq!(findings[3].describe(), "low oxygen saturation (85%)");
    }

    #[test]
    fn custom_thresholds_apply() {
        let strict = Thresholds { heart_rate_max: 100, ..Thresholds::default() };
        let reading = VitalsReading { heart_rate: 110, ..normal() };
        assert!(strict.is_critical(&reading));
        assert!(!is_critical(&reading));
    }
}
