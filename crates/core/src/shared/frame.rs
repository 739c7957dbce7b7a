use std::time::Instant;

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::ArrayView3;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Frames are immutable once built. Consumers that need different pixels
/// (downscaling, annotation) produce a new owned frame.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    sequence: u64,
    captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn from_rgb_image(image: RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, sequence)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Mean over every channel of every pixel; 0.0 for an empty frame.
    pub fn mean_intensity(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| v as u64).sum();
        sum as f64 / self.data.len() as f64
    }

    /// Returns an owned copy scaled by `factor` on both axes.
    ///
    /// Target dimensions are rounded and never collapse below one pixel.
    /// The copy keeps this frame's sequence and capture time.
    pub fn scaled(&self, factor: f64) -> Frame {
        let width = scaled_dimension(self.width, factor);
        let height = scaled_dimension(self.height, factor);
        self.resized(width, height)
    }

    /// Returns an owned copy `width` pixels wide, height following the
    /// source aspect ratio.
    pub fn resized_to_width(&self, width: u32) -> Frame {
        if width == self.width {
            return self.clone();
        }
        let factor = width as f64 / self.width as f64;
        let height = scaled_dimension(self.height, factor);
        self.resized(width.max(1), height)
    }

    fn resized(&self, width: u32, height: u32) -> Frame {
        let resized = match self.to_rgb_image() {
            Some(image) => image::imageops::resize(&image, width, height, FilterType::Triangle),
            None => return self.clone(),
        };
        Frame {
            data: resized.into_raw(),
            width,
            height,
            channels: 3,
            sequence: self.sequence,
            captured_at: self.captured_at,
        }
    }

    /// Copies the pixels into an `RgbImage`; `None` unless the frame is 3-channel.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.channels != 3 {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

fn scaled_dimension(value: u32, factor: f64) -> u32 {
    ((value as f64 * factor).round() as u32).max(1)
}
