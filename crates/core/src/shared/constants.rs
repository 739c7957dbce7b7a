use std::time::Duration;

pub const DEFAULT_CAMERA_URL: &str = "http://192.168.11.101:8080/shot.jpg";
pub const DEFAULT_ACTUATOR_URL: &str = "http://192.168.11.102:80/update";
pub const DEFAULT_ROSTER_DIR: &str = "authorized_faces";

/// Width every fetched frame is resized to before publication.
pub const DISPLAY_WIDTH: u32 = 800;

/// Downscale factor applied to a frame before it reaches the face encoder.
pub const RECOGNITION_SCALE: f64 = 0.4;

/// Recognition runs on every Nth worker iteration that has a frame.
pub const RECOGNITION_INTERVAL: usize = 3;

// Distance bounds are Euclidean distances between L2-normalized ArcFace
// embeddings, where d = sqrt(2 - 2 * cos). Valid range is [0, 2].

/// Coarse match bound: a roster entry is a candidate at or below this
/// distance (cos >= 0.395).
pub const MATCH_TOLERANCE: f64 = 1.1;

/// Strict bound: the best candidate must be strictly below this distance
/// (cos > 0.5).
pub const ACCEPTANCE_THRESHOLD: f64 = 1.0;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(1);
pub const FETCH_BACKOFF: Duration = Duration::from_millis(50);
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);
pub const WORKER_IDLE: Duration = Duration::from_millis(10);

/// Frames darker than this mean intensity are treated as camera misses.
pub const MIN_FRAME_MEAN: f64 = 5.0;

/// Pending notifications held before the oldest is discarded.
pub const NOTIFY_QUEUE_CAPACITY: usize = 4;

/// Consecutive fetch failures between escalation warnings.
pub const FETCH_FAILURE_REPORT_EVERY: usize = 50;

/// Recognition results older than this are reported as stale.
pub const STALE_RECOGNITION: Duration = Duration::from_secs(1);

/// Label reported to the actuator for faces outside the roster.
pub const UNKNOWN_LABEL: &str = "Unauthorized";

pub const DETECTOR_CONFIDENCE: f64 = 0.5;

pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
