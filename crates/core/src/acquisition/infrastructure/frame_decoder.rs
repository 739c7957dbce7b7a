use crate::acquisition::domain::camera_source::FetchError;
use crate::shared::frame::Frame;

/// Decodes an encoded camera image and normalizes it to `display_width`.
///
/// Frames whose mean intensity is below `min_mean` (a black or covered
/// camera) are rejected as [`FetchError::Dark`]; a `min_mean` of 0 accepts
/// everything.
pub fn decode_frame(
    bytes: &[u8],
    display_width: u32,
    min_mean: f64,
    sequence: u64,
) -> Result<Frame, FetchError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    let frame = Frame::from_rgb_image(image, sequence).resized_to_width(display_width);

    if min_mean > 0.0 {
        let mean = frame.mean_intensity();
        if mean < min_mean {
            return Err(FetchError::Dark(mean));
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, value: u8) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([value, value, value]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decodes_and_resizes_to_display_width() {
        let frame = decode_frame(&png_bytes(1600, 900, 120), 800, 5.0, 9).unwrap();
        assert_eq!(frame.width(), 800);
        assert_eq!(frame.height(), 450);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sequence(), 9);
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let err = decode_frame(b"definitely not an image", 800, 5.0, 0).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_dark_frame_is_rejected() {
        let err = decode_frame(&png_bytes(40, 30, 2), 40, 5.0, 0).unwrap_err();
        assert!(matches!(err, FetchError::Dark(mean) if mean < 5.0));
    }

    #[test]
    fn test_zero_floor_accepts_black_frame() {
        assert!(decode_frame(&png_bytes(40, 30, 0), 40, 0.0, 0).is_ok());
    }
}
