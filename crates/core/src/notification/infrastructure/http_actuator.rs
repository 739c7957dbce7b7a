use std::time::Duration;

use reqwest::StatusCode;

use crate::notification::domain::actuator::{Actuator, NotifyError};
use crate::notification::domain::notification_event::ActuatorPayload;

/// Posts decisions as JSON to an HTTP endpoint (e.g. an ESP32's `/update`).
pub struct HttpActuator {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpActuator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl Actuator for HttpActuator {
    fn send(&mut self, payload: &ActuatorPayload) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(payload).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(NotifyError::Status(status.as_u16()));
        }
        let body = response.text().unwrap_or_default();
        log::debug!("Actuator replied: {body}");
        Ok(())
    }
}
