use thiserror::Error;

use super::notification_event::ActuatorPayload;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("actuator request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("actuator returned HTTP {0}")]
    Status(u16),
}

/// Domain interface for the device that acts on access decisions.
pub trait Actuator: Send {
    fn send(&mut self, payload: &ActuatorPayload) -> Result<(), NotifyError>;
}
