//! Errors raised while generating or delivering an alert

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("An alert is already being generated")]
    InFlight,

    #[error("No vitals reading available")]
    NoReading,

    #[error("Generation request failed: {0}")]
    Transport(String),

    #[error("Generation API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("Generation returned no text")]
    EmptyResponse,

    #[error("Notification failed: {0}")]
    Notification(String),
}
