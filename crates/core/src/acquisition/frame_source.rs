use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::acquisition::domain::camera_source::{CameraSource, FetchError};
use crate::acquisition::infrastructure::frame_decoder::decode_frame;
use crate::shared::constants::FETCH_FAILURE_REPORT_EVERY;
use crate::state::shared_state::SharedState;

#[derive(Clone, Debug)]
pub struct FrameSourceSettings {
    pub display_width: u32,
    pub min_frame_mean: f64,
    pub backoff: Duration,
}

/// Counters reported when the loop exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSourceStats {
    pub attempts: usize,
    pub published: usize,
    pub failures: usize,
}

/// Pulls frames from a camera and publishes the newest into [`SharedState`].
///
/// Last write wins: there is no queue, so a slow consumer simply sees the
/// latest frame. Fetch and decode failures are logged and retried after a
/// short backoff; they never end the loop.
pub struct FrameSource {
    camera: Box<dyn CameraSource>,
    state: Arc<SharedState>,
    settings: FrameSourceSettings,
    next_sequence: u64,
    consecutive_failures: usize,
    stats: FrameSourceStats,
}

impl FrameSource {
    pub fn new(
        camera: Box<dyn CameraSource>,
        state: Arc<SharedState>,
        settings: FrameSourceSettings,
    ) -> Self {
        Self {
            camera,
            state,
            settings,
            next_sequence: 1,
            consecutive_failures: 0,
            stats: FrameSourceStats::default(),
        }
    }

    /// Runs until `cancelled` is set, checked between attempts.
    pub fn run(mut self, cancelled: &AtomicBool) -> FrameSourceStats {
        log::info!("Frame source started");
        while !cancelled.load(Ordering::Relaxed) {
            if let Err(e) = self.poll_once() {
                self.record_failure(&e);
                thread::sleep(self.settings.backoff);
            }
        }
        log::info!(
            "Frame source stopped ({} published, {} failed of {} attempts)",
            self.stats.published,
            self.stats.failures,
            self.stats.attempts
        );
        self.stats
    }

    /// One fetch → decode → publish attempt. Publishes nothing on error.
    pub fn poll_once(&mut self) -> Result<(), FetchError> {
        self.stats.attempts += 1;
        let bytes = self.camera.fetch()?;
        let frame = decode_frame(
            &bytes,
            self.settings.display_width,
            self.settings.min_frame_mean,
            self.next_sequence,
        )?;

        self.state.publish_frame(frame);
        self.next_sequence += 1;
        self.stats.published += 1;
        if self.consecutive_failures > 0 {
            log::info!(
                "Camera recovered after {} failed attempts",
                self.consecutive_failures
            );
            self.consecutive_failures = 0;
        }
        Ok(())
    }

    fn record_failure(&mut self, error: &FetchError) {
        self.stats.failures += 1;
        self.consecutive_failures += 1;
        log::warn!("Frame fetch failed: {error}");
        if self.consecutive_failures % FETCH_FAILURE_REPORT_EVERY == 0 {
            log::warn!(
                "Camera unavailable for {} consecutive attempts",
                self.consecutive_failures
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Instant;

    enum Reply {
        Image(u8),
        Fail(u16),
        Garbage,
    }

    /// Plays back scripted replies, then cancels the loop once exhausted.
    struct ScriptedCamera {
        replies: VecDeque<Reply>,
        calls: Arc<Mutex<Vec<Instant>>>,
        cancelled: Arc<AtomicBool>,
    }

    impl CameraSource for ScriptedCamera {
        fn fetch(&mut self) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(Instant::now());
            let reply = self.replies.pop_front();
            if self.replies.is_empty() {
                self.cancelled.store(true, Ordering::Relaxed);
            }
            match reply {
                Some(Reply::Image(value)) => Ok(png(value)),
                Some(Reply::Fail(status)) => Err(FetchError::Status(status)),
                Some(Reply::Garbage) => Ok(b"garbage".to_vec()),
                None => Err(FetchError::Status(500)),
            }
        }
    }

    fn png(value: u8) -> Vec<u8> {
        let image = RgbImage::from_pixel(20, 10, Rgb([value, value, value]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn settings(backoff_ms: u64) -> FrameSourceSettings {
        FrameSourceSettings {
            display_width: 10,
            min_frame_mean: 5.0,
            backoff: Duration::from_millis(backoff_ms),
        }
    }

    fn scripted(
        replies: Vec<Reply>,
    ) -> (ScriptedCamera, Arc<Mutex<Vec<Instant>>>, Arc<AtomicBool>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let cancelled = Arc::new(AtomicBool::new(false));
        let camera = ScriptedCamera {
            replies: replies.into(),
            calls: calls.clone(),
            cancelled: cancelled.clone(),
        };
        (camera, calls, cancelled)
    }

    #[test]
    fn test_publishes_resized_frame() {
        let state = Arc::new(SharedState::new());
        let (camera, _, _) = scripted(vec![Reply::Image(100)]);
        let mut source = FrameSource::new(Box::new(camera), state.clone(), settings(0));

        source.poll_once().unwrap();
        let frame = state.latest_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (10, 5));
        assert_eq!(frame.sequence(), 1);
    }

    #[test]
    fn test_failed_poll_publishes_nothing() {
        let state = Arc::new(SharedState::new());
        let (camera, _, _) = scripted(vec![Reply::Fail(404)]);
        let mut source = FrameSource::new(Box::new(camera), state.clone(), settings(0));

        assert!(matches!(source.poll_once(), Err(FetchError::Status(404))));
        assert!(state.latest_frame().is_none());
    }

    #[test]
    fn test_failures_never_end_the_loop() {
        let state = Arc::new(SharedState::new());
        let k = 5;
        let mut replies: Vec<Reply> = (0..k).map(|_| Reply::Fail(503)).collect();
        replies.push(Reply::Garbage);
        replies.push(Reply::Image(0)); // too dark
        replies.push(Reply::Image(90));
        let (camera, calls, cancelled) = scripted(replies);

        let source = FrameSource::new(Box::new(camera), state.clone(), settings(5));
        let stats = source.run(&cancelled);

        assert_eq!(stats.attempts, k + 3);
        assert_eq!(stats.failures, k + 2);
        assert_eq!(stats.published, 1);
        assert_eq!(calls.lock().unwrap().len(), k + 3);
        assert!(state.latest_frame().is_some());
    }

    #[test]
    fn test_backoff_applied_between_failed_attempts() {
        let state = Arc::new(SharedState::new());
        let (camera, calls, cancelled) =
            scripted(vec![Reply::Fail(500), Reply::Fail(500), Reply::Fail(500)]);

        FrameSource::new(Box::new(camera), state, settings(20)).run(&cancelled);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_sequence_increments_per_published_frame() {
        let state = Arc::new(SharedState::new());
        let (camera, _, _) = scripted(vec![Reply::Image(50), Reply::Fail(500), Reply::Image(60)]);
        let mut source = FrameSource::new(Box::new(camera), state.clone(), settings(0));

        source.poll_once().unwrap();
        assert!(source.poll_once().is_err());
        source.poll_once().unwrap();
        assert_eq!(state.latest_frame().unwrap().sequence(), 2);
    }

    #[test]
    fn test_cancelled_before_start_makes_no_attempts() {
        let state = Arc::new(SharedState::new());
        let (camera, calls, _) = scripted(vec![Reply::Image(50)]);
        let cancelled = AtomicBool::new(true);

        let stats = FrameSource::new(Box::new(camera), state, settings(0)).run(&cancelled);
        assert_eq!(stats.attempts, 0);
        assert!(calls.lock().unwrap().is_empty());
    }
}
