//! monitor/mod.rs
//!
//! The live vitals monitor.
//!
//! # Pieces
//!
//! - **TelemetrySimulator**: synthesizes a reading per tick
//! - **VitalsHistory**: bounded ring buffer of the session's samples
//! - **Thresholds**: the critical-state predicate
//! - **MonitorSession**: owns the timer loop, publishes readings and events,
//!   and launches the one-shot automatic alert
//!
//! # Tick
//!
//! ```text
//! interval fires
//!   ↓
//! simulator → sample → history (evict oldest) → readings channel → Reading event
//!   ↓ (critical?)
//! CriticalDetected event
//!   ↓ (first of the session?)
//! spawn alert generation → AlertReady | AlertFailed
//! ```

pub mod detector;
pub mod history;
pub mod report;
pub mod session;
pub mod simulator;

pub use detector::{is_critical, Finding, Thresholds};
pub use history::{VitalsHistory, DEFAULT_HISTORY_CAPACITY};
pub use report::SessionReport;
pub use session::{MonitorEvent, MonitorSession};
pub use simulator::{SimulatorConfig, TelemetrySimulator};
