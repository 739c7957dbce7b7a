use std::time::Duration;

use crate::recognition::domain::identity::{AccessDecision, Detection};
use crate::shared::frame::Frame;

/// Everything a renderer needs for one presented frame.
pub struct RenderView<'a> {
    pub frame: &'a Frame,
    pub detections: &'a [Detection],
    pub decision: AccessDecision,
    pub fps: f64,
    /// Time since the last recognition pass, if one has completed.
    pub recognition_age: Option<Duration>,
}

impl RenderView<'_> {
    /// The overlay text: status, frame rate and recognition age.
    pub fn status_line(&self) -> String {
        let status = if self.decision.is_granted() {
            "ACCESS GRANTED"
        } else {
            "ACCESS DENIED"
        };
        let age = match self.recognition_age {
            Some(age) => format!("{:.1}s ago", age.as_secs_f64()),
            None => "pending".to_string(),
        };
        format!(
            "Status: {status} | FPS: {:.1} | Face Check: {age} | Faces: {}",
            self.fps,
            self.detections.len()
        )
    }
}

/// Domain interface for whatever displays the annotated frame.
pub trait FrameRenderer {
    fn render(&mut self, view: &RenderView<'_>) -> Result<(), Box<dyn std::error::Error>>;
}

/// Renderer for deployments without a display. Reports recognition going
/// stale or recovering instead of drawing it.
pub struct HeadlessRenderer {
    stale_after: Duration,
    stale: bool,
}

impl HeadlessRenderer {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            stale: false,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl FrameRenderer for HeadlessRenderer {
    fn render(&mut self, view: &RenderView<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let stale = view.recognition_age.is_some_and(|age| age > self.stale_after);
        if stale != self.stale {
            self.stale = stale;
            if stale {
                log::debug!("Recognition is stale: {}", view.status_line());
            } else {
                log::debug!("Recognition caught up: {}", view.status_line());
            }
        }
        Ok(())
    }
}
