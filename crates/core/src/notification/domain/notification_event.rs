use chrono::{DateTime, Local};
use serde::Serialize;

use crate::recognition::domain::identity::AccessDecision;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A decision transition, built fresh for each one and consumed by a single
/// actuator send.
#[derive(Clone, Debug)]
pub struct NotificationEvent {
    pub decision: AccessDecision,
    pub timestamp: DateTime<Local>,
    pub detected: Vec<String>,
    pub fps: f64,
}

impl NotificationEvent {
    pub fn new(decision: AccessDecision, detected: Vec<String>, fps: f64) -> Self {
        Self {
            decision,
            timestamp: Local::now(),
            detected,
            fps,
        }
    }

    pub fn payload(&self) -> ActuatorPayload {
        ActuatorPayload {
            status: self.decision.as_status().to_string(),
            timestamp: self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            details: PayloadDetails {
                detected_faces: self.detected.clone(),
                fps: format!("{:.1}", self.fps),
            },
        }
    }
}

/// JSON body posted to the actuator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActuatorPayload {
    pub status: String,
    pub timestamp: String,
    pub details: PayloadDetails,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayloadDetails {
    pub detected_faces: Vec<String>,
    pub fps: String,
}
