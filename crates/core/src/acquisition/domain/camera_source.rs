use thiserror::Error;

/// Why one acquisition attempt produced no frame. Always transient.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("camera request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("camera returned HTTP {0}")]
    Status(u16),
    #[error("failed to decode camera image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("frame too dark (mean {0:.2})")]
    Dark(f64),
}

/// Domain interface for pulling one encoded image from a camera.
pub trait CameraSource: Send {
    fn fetch(&mut self) -> Result<Vec<u8>, FetchError>;
}
