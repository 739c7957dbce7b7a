use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::notification::domain::notification_event::NotificationEvent;
use crate::notification::notification_dispatcher::NotificationDispatcher;
use crate::presentation::decision_edge::DecisionEdge;
use crate::presentation::frame_rate::FrameRateMeter;
use crate::presentation::frame_renderer::{FrameRenderer, RenderView};
use crate::recognition::domain::identity::AccessDecision;
use crate::state::shared_state::{RecognitionPass, SharedState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Nothing new to present.
    Idle,
    /// A frame was presented; carries the decision if it was a transition.
    Presented(Option<AccessDecision>),
}

/// Presents the latest state and turns decision changes into notifications.
///
/// Owns the decision edge: no other component reads or writes it.
pub struct PresentationLoop {
    state: Arc<SharedState>,
    renderer: Box<dyn FrameRenderer>,
    edge: DecisionEdge,
    meter: FrameRateMeter,
    idle: Duration,
    last_frame: Option<u64>,
    last_pass: Option<Arc<RecognitionPass>>,
}

impl PresentationLoop {
    pub fn new(state: Arc<SharedState>, renderer: Box<dyn FrameRenderer>, idle: Duration) -> Self {
        Self {
            state,
            renderer,
            edge: DecisionEdge::new(),
            meter: FrameRateMeter::new(),
            idle,
            last_frame: None,
            last_pass: None,
        }
    }

    /// Runs on the calling thread until `cancelled` is set.
    pub fn run(&mut self, cancelled: &AtomicBool, dispatcher: &NotificationDispatcher) {
        log::info!("Presentation loop started");
        while !cancelled.load(Ordering::Relaxed) {
            if self.step(dispatcher) == Step::Idle {
                thread::sleep(self.idle);
            }
        }
        log::info!("Presentation loop stopped");
    }

    pub fn step(&mut self, dispatcher: &NotificationDispatcher) -> Step {
        let snapshot = self.state.snapshot();
        let Some(frame) = snapshot.frame.as_ref() else {
            return Step::Idle;
        };
        let same_frame = self.last_frame == Some(frame.sequence());
        let same_pass = match (&self.last_pass, &snapshot.pass) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same_frame && same_pass {
            return Step::Idle;
        }
        self.last_frame = Some(frame.sequence());
        self.last_pass = snapshot.pass.clone();

        let fps = self.meter.tick();
        let decision = snapshot.decision();
        let pass = snapshot.pass.as_deref();
        let view = RenderView {
            frame,
            detections: pass.map(RecognitionPass::detections).unwrap_or_default(),
            decision,
            fps,
            recognition_age: pass.map(|p| p.completed_at().elapsed()),
        };
        if let Err(e) = self.renderer.render(&view) {
            log::warn!("Render failed: {e}");
        }

        if !self.edge.observe(decision) {
            return Step::Presented(None);
        }
        let labels = pass.map(RecognitionPass::labels).unwrap_or_default();
        log::info!("Access {}: {:?}", decision.as_status(), labels);
        dispatcher.dispatch(NotificationEvent::new(decision, labels, fps));
        Step::Presented(Some(decision))
    }
}
