//! Prompt text for the alert generator

use crate::monitor::detector::Finding;
use crate::types::vitals::VitalsReading;

use super::locale::Language;

/// Build the instruction sent to the text generator for one alert
pub fn compose_prompt(reading: &VitalsReading, findings: &[Finding], language: Language) -> String {
    let assessment = if findings.is_empty() {
        "No threshold is currently crossed; the user requested this alert manually.".to_string()
    } else {
        let described: Vec<String> = findings.iter().map(Finding::describe).collect();
        format!("Critical findings: {}.", described.join(", "))
    };

    format!(
        "You are the emergency assistant of a personal health monitor. \
         Write a short, calm emergency alert for the user and their caregivers.\n\
         Current vitals: heart rate {} bpm, blood pressure {}/{} mmHg, SpO2 {}%.\n\
         {}\n\
         State what is abnormal, give two or three immediate safety steps, and advise \
         contacting emergency services. Do not speculate about a diagnosis. \
         Answer in {} using at most 80 words of plain text.",
        reading.heart_rate,
        reading.blood_pressure.systolic,
        reading.blood_pressure.diastolic,
        reading.spo2,
        assessment,
        language.name(),
    )
}
