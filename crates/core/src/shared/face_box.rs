/// A located face in pixel coordinates, stored as `(top, right, bottom, left)`.
///
/// Coordinates are relative to whichever frame the box was found in; the
/// recognition worker maps boxes from the downscaled frame back to the
/// published frame with [`FaceBox::to_full_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Builds a box from corner coordinates `(x1, y1, x2, y2)`, clamped to the
    /// frame and truncated to whole pixels.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, frame_w: u32, frame_h: u32) -> Self {
        let max_x = frame_w as f64;
        let max_y = frame_h as f64;
        Self {
            top: y1.clamp(0.0, max_y) as i32,
            right: x2.clamp(0.0, max_x) as i32,
            bottom: y2.clamp(0.0, max_y) as i32,
            left: x1.clamp(0.0, max_x) as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Projects the box into a frame scaled by `factor`, rounding to the
    /// nearest pixel the way the scaled frame's dimensions are rounded.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |v: i32| (v as f64 * factor).round() as i32;
        Self {
            top: scale(self.top),
            right: scale(self.right),
            bottom: scale(self.bottom),
            left: scale(self.left),
        }
    }

    /// Maps a box found in a frame downscaled by `factor` back to the source
    /// frame. Each coordinate is divided by `factor` and truncated toward zero.
    pub fn to_full_frame(&self, factor: f64) -> Self {
        let inverse = 1.0 / factor;
        let unscale = |v: i32| (v as f64 * inverse) as i32;
        Self {
            top: unscale(self.top),
            right: unscale(self.right),
            bottom: unscale(self.bottom),
            left: unscale(self.left),
        }
    }
}
