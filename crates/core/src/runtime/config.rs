use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::acquisition::frame_source::FrameSourceSettings;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::recognition_worker::RecognitionSettings;
use crate::shared::constants::{
    ACCEPTANCE_THRESHOLD, DEFAULT_ACTUATOR_URL, DEFAULT_CAMERA_URL, DEFAULT_ROSTER_DIR,
    DETECTOR_CONFIDENCE, DISPLAY_WIDTH, FETCH_BACKOFF, FETCH_TIMEOUT, MATCH_TOLERANCE,
    MIN_FRAME_MEAN, NOTIFY_QUEUE_CAPACITY, NOTIFY_TIMEOUT, RECOGNITION_INTERVAL,
    RECOGNITION_SCALE, STALE_RECOGNITION, WORKER_IDLE,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptyUrl(&'static str),
    #[error("display width must be at least 1")]
    ZeroWidth,
    #[error("recognition scale must be in (0, 1], got {0}")]
    InvalidScale(f64),
    #[error("recognition interval must be at least 1")]
    ZeroInterval,
    #[error("{name} must be a positive number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("acceptance threshold {threshold} exceeds match tolerance {tolerance}")]
    ThresholdAboveTolerance { threshold: f64, tolerance: f64 },
    #[error("minimum frame brightness must be a finite non-negative number, got {0}")]
    InvalidFrameFloor(f64),
    #[error("detector confidence must be in (0, 1], got {0}")]
    InvalidConfidence(f64),
    #[error("notification queue capacity must be at least 1")]
    ZeroQueueCapacity,
}

/// Every tunable of the access-control system.
#[derive(Clone, Debug)]
pub struct AccessConfig {
    pub camera_url: String,
    pub actuator_url: String,
    pub roster_dir: PathBuf,
    /// Directory searched for model files before the user cache.
    pub model_dir: Option<PathBuf>,
    pub display_width: u32,
    pub recognition_scale: f64,
    pub recognition_interval: usize,
    pub match_tolerance: f64,
    pub acceptance_threshold: f64,
    pub detector_confidence: f64,
    pub fetch_timeout: Duration,
    pub fetch_backoff: Duration,
    pub min_frame_mean: f64,
    pub notify_timeout: Duration,
    pub notify_queue_capacity: usize,
    pub worker_idle: Duration,
    pub stale_recognition: Duration,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            camera_url: DEFAULT_CAMERA_URL.to_string(),
            actuator_url: DEFAULT_ACTUATOR_URL.to_string(),
            roster_dir: PathBuf::from(DEFAULT_ROSTER_DIR),
            model_dir: None,
            display_width: DISPLAY_WIDTH,
            recognition_scale: RECOGNITION_SCALE,
            recognition_interval: RECOGNITION_INTERVAL,
            match_tolerance: MATCH_TOLERANCE,
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            detector_confidence: DETECTOR_CONFIDENCE,
            fetch_timeout: FETCH_TIMEOUT,
            fetch_backoff: FETCH_BACKOFF,
            min_frame_mean: MIN_FRAME_MEAN,
            notify_timeout: NOTIFY_TIMEOUT,
            notify_queue_capacity: NOTIFY_QUEUE_CAPACITY,
            worker_idle: WORKER_IDLE,
            stale_recognition: STALE_RECOGNITION,
        }
    }
}

impl AccessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("camera URL"));
        }
        if self.actuator_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("actuator URL"));
        }
        if self.display_width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if !(self.recognition_scale > 0.0 && self.recognition_scale <= 1.0) {
            return Err(ConfigError::InvalidScale(self.recognition_scale));
        }
        if self.recognition_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        positive("match tolerance", self.match_tolerance)?;
        positive("acceptance threshold", self.acceptance_threshold)?;
        if self.acceptance_threshold > self.match_tolerance {
            return Err(ConfigError::ThresholdAboveTolerance {
                threshold: self.acceptance_threshold,
                tolerance: self.match_tolerance,
            });
        }
        if !(self.detector_confidence > 0.0 && self.detector_confidence <= 1.0) {
            return Err(ConfigError::InvalidConfidence(self.detector_confidence));
        }
        if !self.min_frame_mean.is_finite() || self.min_frame_mean < 0.0 {
            return Err(ConfigError::InvalidFrameFloor(self.min_frame_mean));
        }
        if self.notify_queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }

    pub fn frame_source_settings(&self) -> FrameSourceSettings {
        FrameSourceSettings {
            display_width: self.display_width,
            min_frame_mean: self.min_frame_mean,
            backoff: self.fetch_backoff,
        }
    }

    pub fn recognition_settings(&self) -> RecognitionSettings {
        RecognitionSettings {
            scale: self.recognition_scale,
            interval: self.recognition_interval,
            idle: self.worker_idle,
        }
    }

    pub fn matcher(&self) -> FaceMatcher {
        FaceMatcher::new(self.match_tolerance, self.acceptance_threshold)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}
