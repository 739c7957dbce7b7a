use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::identity::Detection;
use crate::recognition::domain::roster::AuthorizedRoster;
use crate::shared::frame::Frame;
use crate::state::shared_state::{RecognitionPass, SharedState};

#[derive(Clone, Debug)]
pub struct RecognitionSettings {
    /// Downscale factor applied before encoding, in (0, 1].
    pub scale: f64,
    /// Run a pass on every Nth iteration that finds a frame.
    pub interval: usize,
    /// Sleep between iterations.
    pub idle: Duration,
}

/// Periodically identifies faces in the latest frame.
///
/// Recognition is the expensive step, so it runs on its own thread at a
/// fraction of the acquisition rate and on a downscaled copy of the frame.
/// Boxes are mapped back to full-frame coordinates before publication.
pub struct RecognitionWorker {
    encoder: Box<dyn FaceEncoder>,
    matcher: FaceMatcher,
    roster: Arc<AuthorizedRoster>,
    state: Arc<SharedState>,
    settings: RecognitionSettings,
    iterations: usize,
}

impl RecognitionWorker {
    pub fn new(
        encoder: Box<dyn FaceEncoder>,
        matcher: FaceMatcher,
        roster: Arc<AuthorizedRoster>,
        state: Arc<SharedState>,
        settings: RecognitionSettings,
    ) -> Self {
        Self {
            encoder,
            matcher,
            roster,
            state,
            settings,
            iterations: 0,
        }
    }

    /// Runs until `cancelled` is set, checked between iterations.
    pub fn run(mut self, cancelled: &AtomicBool) {
        log::info!(
            "Recognition worker started (every {} frames at {:.2}x)",
            self.settings.interval,
            self.settings.scale
        );
        while !cancelled.load(Ordering::Relaxed) {
            self.tick();
            thread::sleep(self.settings.idle);
        }
        log::info!("Recognition worker stopped");
    }

    /// One loop iteration. Returns `true` if a pass was published.
    pub fn tick(&mut self) -> bool {
        let Some(frame) = self.state.latest_frame() else {
            return false;
        };
        self.iterations += 1;
        if self.iterations % self.settings.interval.max(1) != 0 {
            return false;
        }

        let started = Instant::now();
        match self.recognize(&frame) {
            Ok(pass) => {
                log::debug!(
                    "Recognition pass on frame {}: {:?} {:?} in {:.1}ms",
                    frame.sequence(),
                    pass.decision(),
                    pass.labels(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
                self.state.publish_pass(pass);
                true
            }
            Err(e) => {
                log::warn!("Recognition failed on frame {}: {e}", frame.sequence());
                false
            }
        }
    }

    /// Encodes a downscaled copy of `frame` and resolves every face against
    /// the roster. Zero faces is a valid, empty pass.
    pub fn recognize(
        &mut self,
        frame: &Frame,
    ) -> Result<RecognitionPass, Box<dyn std::error::Error>> {
        let scale = self.settings.scale;
        let small = frame.scaled(scale);
        let faces = self.encoder.encode(&small)?;

        let detections = faces
            .into_iter()
            .map(|face| {
                let result = self.matcher.resolve(&self.roster, &face.embedding);
                Detection {
                    face_box: face.face_box.to_full_frame(scale),
                    identity: result.identity,
                    distance: result.distance,
                }
            })
            .collect();

        Ok(RecognitionPass::new(detections, frame.sequence()))
    }
}
