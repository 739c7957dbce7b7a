use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::acquisition::domain::camera_source::CameraSource;
use crate::acquisition::frame_source::{FrameSource, FrameSourceStats};
use crate::notification::domain::actuator::Actuator;
use crate::notification::notification_dispatcher::NotificationDispatcher;
use crate::presentation::frame_renderer::FrameRenderer;
use crate::presentation::presentation_loop::PresentationLoop;
use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::roster::AuthorizedRoster;
use crate::recognition::recognition_worker::RecognitionWorker;
use crate::runtime::config::{AccessConfig, ConfigError};
use crate::state::shared_state::SharedState;

/// The adapters the system runs against.
pub struct Components {
    pub camera: Box<dyn CameraSource>,
    pub encoder: Box<dyn FaceEncoder>,
    pub actuator: Box<dyn Actuator>,
    pub renderer: Box<dyn FrameRenderer>,
}

/// Wires the frame source, recognition worker, presentation loop and
/// notification dispatcher around one [`SharedState`].
pub struct AccessControlSystem {
    config: AccessConfig,
    roster: Arc<AuthorizedRoster>,
    state: Arc<SharedState>,
}

impl AccessControlSystem {
    pub fn new(config: AccessConfig, roster: AuthorizedRoster) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            roster: Arc::new(roster),
            state: Arc::new(SharedState::new()),
        })
    }

    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Runs until `cancelled` is set, presenting on the calling thread.
    ///
    /// Either worker exiting early (including by panic) also sets
    /// `cancelled`, so the whole system stops together. Returns an error if
    /// a thread could not be started or a worker panicked.
    pub fn run(
        self,
        components: Components,
        cancelled: Arc<AtomicBool>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Components {
            camera,
            encoder,
            actuator,
            renderer,
        } = components;

        log::info!(
            "Starting access control: camera {}, actuator {}, {} authorized identities",
            self.config.camera_url,
            self.config.actuator_url,
            self.roster.len()
        );

        let dispatcher =
            NotificationDispatcher::spawn(actuator, self.config.notify_queue_capacity)?;

        let source = FrameSource::new(
            camera,
            Arc::clone(&self.state),
            self.config.frame_source_settings(),
        );
        let source_handle = spawn_worker("frame-source", &cancelled, move |c| source.run(c))?;

        let worker = RecognitionWorker::new(
            encoder,
            self.config.matcher(),
            Arc::clone(&self.roster),
            Arc::clone(&self.state),
            self.config.recognition_settings(),
        );
        let worker_handle = match spawn_worker("recognition", &cancelled, move |c| worker.run(c))
        {
            Ok(handle) => handle,
            Err(e) => {
                cancelled.store(true, Ordering::Relaxed);
                let _ = source_handle.join();
                return Err(e.into());
            }
        };

        let mut presenter =
            PresentationLoop::new(Arc::clone(&self.state), renderer, self.config.worker_idle);
        presenter.run(&cancelled, &dispatcher);

        cancelled.store(true, Ordering::Relaxed);
        join_threads(source_handle, worker_handle, dispatcher)
    }
}

/// Sets the flag when dropped, which includes unwinding out of a panic.
/// Release builds use `panic = "abort"`, where a panic ends the process
/// before any guard runs; worker errors must travel as `Err`, not panics.
struct CancelOnExit(Arc<AtomicBool>);

impl Drop for CancelOnExit {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn spawn_worker<T, F>(
    name: &str,
    cancelled: &Arc<AtomicBool>,
    body: F,
) -> std::io::Result<JoinHandle<T>>
where
    F: FnOnce(&AtomicBool) -> T + Send + 'static,
    T: Send + 'static,
{
    let cancelled = Arc::clone(cancelled);
    thread::Builder::new().name(name.to_string()).spawn(move || {
        let _guard = CancelOnExit(Arc::clone(&cancelled));
        body(&cancelled)
    })
}

/// Joins the workers, stops the dispatcher and reports the first failure.
/// Notifications still queued at this point are discarded.
fn join_threads(
    source_handle: JoinHandle<FrameSourceStats>,
    worker_handle: JoinHandle<()>,
    dispatcher: NotificationDispatcher,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut first_error: Option<Box<dyn std::error::Error>> = None;

    match source_handle.join() {
        Ok(stats) => log::debug!("Frame source totals: {stats:?}"),
        Err(_) => first_error = Some("Frame source thread panicked".into()),
    }

    if worker_handle.join().is_err() && first_error.is_none() {
        first_error = Some("Recognition thread panicked".into());
    }

    let delivered = dispatcher.shutdown_now();
    log::info!("Access control stopped ({delivered} notifications delivered)");

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
