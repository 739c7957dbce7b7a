use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::recognition::domain::identity::{AccessDecision, Detection};
use crate::shared::frame::Frame;

/// Result of one recognition pass. The decision is derived from the
/// detections at construction and cannot be set independently.
#[derive(Clone, Debug)]
pub struct RecognitionPass {
    detections: Vec<Detection>,
    decision: AccessDecision,
    completed_at: Instant,
    frame_sequence: u64,
}

impl RecognitionPass {
    pub fn new(detections: Vec<Detection>, frame_sequence: u64) -> Self {
        let decision = AccessDecision::from_detections(&detections);
        Self {
            detections,
            decision,
            completed_at: Instant::now(),
            frame_sequence,
        }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn decision(&self) -> AccessDecision {
        self.decision
    }

    pub fn completed_at(&self) -> Instant {
        self.completed_at
    }

    /// Sequence number of the frame this pass was computed from.
    pub fn frame_sequence(&self) -> u64 {
        self.frame_sequence
    }

    /// Identity labels in detection order.
    pub fn labels(&self) -> Vec<String> {
        self.detections
            .iter()
            .map(|d| d.identity.label().to_string())
            .collect()
    }
}

/// A consistent view of the shared state at one instant.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub frame: Option<Arc<Frame>>,
    pub pass: Option<Arc<RecognitionPass>>,
}

impl Snapshot {
    /// Denied until the first recognition pass lands.
    pub fn decision(&self) -> AccessDecision {
        self.pass
            .as_ref()
            .map_or(AccessDecision::Denied, |p| p.decision())
    }
}

#[derive(Default)]
struct Inner {
    frame: Option<Arc<Frame>>,
    pass: Option<Arc<RecognitionPass>>,
}

/// The one point of coordination between the frame source, the
/// recognition worker and the presentation loop.
///
/// Every critical section is a single pointer assignment or clone: values
/// are wrapped in `Arc` before the lock is taken, and readers leave with
/// their own handles. Published frames and passes are never mutated, so a
/// reader can hold its handle indefinitely without observing a change.
#[derive(Default)]
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the latest frame (last write wins).
    pub fn publish_frame(&self, frame: Frame) {
        let frame = Arc::new(frame);
        self.lock().frame = Some(frame);
    }

    /// Replaces detections, decision and pass time as one group.
    pub fn publish_pass(&self, pass: RecognitionPass) {
        let pass = Arc::new(pass);
        self.lock().pass = Some(pass);
    }

    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.lock().frame.clone()
    }

    pub fn latest_pass(&self) -> Option<Arc<RecognitionPass>> {
        self.lock().pass.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            frame: inner.frame.clone(),
            pass: inner.pass.clone(),
        }
    }

    // Every critical section is a plain assignment or clone, so a panic
    // while holding the lock cannot leave a half-written value behind.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
