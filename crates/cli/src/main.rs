use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use aura_core::acquisition::infrastructure::http_camera::HttpCamera;
use aura_core::notification::infrastructure::http_actuator::HttpActuator;
use aura_core::presentation::frame_renderer::HeadlessRenderer;
use aura_core::recognition::domain::face_encoder::FaceEncoder;
use aura_core::recognition::infrastructure::model_resolver::{self, ProgressFn};
use aura_core::recognition::infrastructure::onnx_face_encoder::OnnxFaceEncoder;
use aura_core::recognition::infrastructure::roster_loader::load_roster;
use aura_core::runtime::access_control_system::{AccessControlSystem, Components};
use aura_core::runtime::config::AccessConfig;
use aura_core::shared::constants::{
    ACCEPTANCE_THRESHOLD, DEFAULT_ACTUATOR_URL, DEFAULT_CAMERA_URL, DEFAULT_ROSTER_DIR,
    DETECTOR_CONFIDENCE, DISPLAY_WIDTH, EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL,
    FACE_MODEL_NAME, FACE_MODEL_URL, FETCH_BACKOFF, FETCH_TIMEOUT, MATCH_TOLERANCE,
    MIN_FRAME_MEAN, NOTIFY_QUEUE_CAPACITY, NOTIFY_TIMEOUT, RECOGNITION_INTERVAL,
    RECOGNITION_SCALE, STALE_RECOGNITION, WORKER_IDLE,
};

/// Camera-driven access control: recognizes authorized faces and notifies
/// an actuator whenever the access decision changes. Stop with Ctrl+C.
#[derive(Parser)]
#[command(name = "aura")]
struct Cli {
    /// URL returning a single encoded camera frame.
    #[arg(long, env = "AURA_CAMERA_URL", default_value = DEFAULT_CAMERA_URL)]
    camera_url: String,

    /// URL the access decision is POSTed to.
    #[arg(long, env = "AURA_ACTUATOR_URL", default_value = DEFAULT_ACTUATOR_URL)]
    actuator_url: String,

    /// Directory of reference images, one identity per file stem.
    #[arg(long, env = "AURA_ROSTER_DIR", default_value = DEFAULT_ROSTER_DIR)]
    roster_dir: PathBuf,

    /// Directory searched for model files before the user cache.
    #[arg(long, env = "AURA_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Width frames are resized to after fetching.
    #[arg(long, env = "AURA_DISPLAY_WIDTH", default_value_t = DISPLAY_WIDTH)]
    display_width: u32,

    /// Downscale factor for recognition (0.0-1.0].
    #[arg(long, env = "AURA_RECOGNITION_SCALE", default_value_t = RECOGNITION_SCALE)]
    recognition_scale: f64,

    /// Run recognition every Nth worker iteration.
    #[arg(long, env = "AURA_RECOGNITION_INTERVAL", default_value_t = RECOGNITION_INTERVAL)]
    recognition_interval: usize,

    /// Coarse match distance bound (inclusive).
    #[arg(long, env = "AURA_MATCH_TOLERANCE", default_value_t = MATCH_TOLERANCE)]
    match_tolerance: f64,

    /// Best-match distance must be strictly below this to grant access.
    #[arg(long, env = "AURA_ACCEPTANCE_THRESHOLD", default_value_t = ACCEPTANCE_THRESHOLD)]
    acceptance_threshold: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, env = "AURA_DETECTOR_CONFIDENCE", default_value_t = DETECTOR_CONFIDENCE)]
    confidence: f64,

    /// Camera request timeout in milliseconds.
    #[arg(long, env = "AURA_FETCH_TIMEOUT_MS", default_value_t = millis(FETCH_TIMEOUT))]
    fetch_timeout_ms: u64,

    /// Delay after a failed fetch in milliseconds.
    #[arg(long, env = "AURA_FETCH_BACKOFF_MS", default_value_t = millis(FETCH_BACKOFF))]
    fetch_backoff_ms: u64,

    /// Frames with a lower mean brightness are skipped (0 disables).
    #[arg(long, env = "AURA_MIN_FRAME_MEAN", default_value_t = MIN_FRAME_MEAN)]
    min_frame_mean: f64,

    /// Actuator request timeout in milliseconds.
    #[arg(long, env = "AURA_NOTIFY_TIMEOUT_MS", default_value_t = millis(NOTIFY_TIMEOUT))]
    notify_timeout_ms: u64,

    /// Pending notifications held while the actuator is busy.
    #[arg(long, env = "AURA_NOTIFY_QUEUE", default_value_t = NOTIFY_QUEUE_CAPACITY)]
    notify_queue: usize,

    /// Idle sleep of the worker and presentation loops in milliseconds.
    #[arg(long, env = "AURA_IDLE_MS", default_value_t = millis(WORKER_IDLE))]
    idle_ms: u64,

    /// Age after which the last recognition is shown as stale, in milliseconds.
    #[arg(long, env = "AURA_STALE_RECOGNITION_MS", default_value_t = millis(STALE_RECOGNITION))]
    stale_recognition_ms: u64,
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

impl Cli {
    fn into_config(self) -> AccessConfig {
        AccessConfig {
            camera_url: self.camera_url,
            actuator_url: self.actuator_url,
            roster_dir: self.roster_dir,
            model_dir: self.model_dir,
            display_width: self.display_width,
            recognition_scale: self.recognition_scale,
            recognition_interval: self.recognition_interval,
            match_tolerance: self.match_tolerance,
            acceptance_threshold: self.acceptance_threshold,
            detector_confidence: self.confidence,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            fetch_backoff: Duration::from_millis(self.fetch_backoff_ms),
            min_frame_mean: self.min_frame_mean,
            notify_timeout: Duration::from_millis(self.notify_timeout_ms),
            notify_queue_capacity: self.notify_queue,
            worker_idle: Duration::from_millis(self.idle_ms),
            stale_recognition: Duration::from_millis(self.stale_recognition_ms),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config();
    config.validate()?;

    let mut encoder = build_encoder(&config)?;

    log::info!("Loading authorized faces from {}", config.roster_dir.display());
    let roster = load_roster(&config.roster_dir, encoder.as_mut())?;
    log::info!("Loaded {} authorized identities", roster.len());

    let camera = HttpCamera::new(&config.camera_url, config.fetch_timeout)?;
    let actuator = HttpActuator::new(&config.actuator_url, config.notify_timeout)?;
    let renderer = HeadlessRenderer::new(config.stale_recognition);

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, shutting down");
        flag.store(true, Ordering::Relaxed);
    })?;

    let system = AccessControlSystem::new(config, roster)?;
    system.run(
        Components {
            camera: Box::new(camera),
            encoder,
            actuator: Box::new(actuator),
            renderer: Box::new(renderer),
        },
        cancelled,
    )
}

fn build_encoder(
    config: &AccessConfig,
) -> Result<Box<dyn FaceEncoder>, Box<dyn std::error::Error>> {
    let model_dir = config.model_dir.as_deref();

    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let face_model = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        model_dir,
        Some(progress("face detection")),
    )?;

    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedding_model = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        model_dir,
        Some(progress("face embedding")),
    )?;

    Ok(Box::new(OnnxFaceEncoder::new(
        &face_model,
        &embedding_model,
        config.detector_confidence,
    )?))
}

fn progress(what: &'static str) -> ProgressFn {
    Box::new(move |done, total| download_progress(what, done, total))
}

fn download_progress(what: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {what} model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {what} model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_config() {
        let config = Cli::try_parse_from(["aura"]).unwrap().into_config();
        assert_eq!(config.stale_recognition, STALE_RECOGNITION);
        assert_eq!(config.match_tolerance, MATCH_TOLERANCE);
        assert_eq!(config.notify_timeout, NOTIFY_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stale_recognition_is_configurable() {
        let config = Cli::try_parse_from(["aura", "--stale-recognition-ms", "2500"])
            .unwrap()
            .into_config();
        assert_eq!(config.stale_recognition, Duration::from_millis(2500));
    }
}
