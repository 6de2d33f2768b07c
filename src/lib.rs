// vitalwatch - Real-time vitals monitoring and critical-state alerting

pub mod alert;
pub mod channel;
pub mod chart;
pub mod config;
pub mod monitor;
pub mod storage;
pub mod types;

pub use alert::{AlertError, AlertGenerator, AlertMessage, AlertTrigger, Language};
pub use config::{ConfigError, MonitorConfig};
pub use monitor::{MonitorEvent, MonitorSession, SessionReport, Thresholds, VitalsHistory};
pub use types::vitals::{BloodPressure, VitalsReading, VitalsSample};
