use ndarray::Array1;

use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

pub type Embedding = Array1<f32>;

/// A face found by an encoder, with its box in the coordinates of the frame
/// it was found in.
#[derive(Clone, Debug)]
pub struct EncodedFace {
    pub face_box: FaceBox,
    pub embedding: Embedding,
}

/// Domain interface for face location and embedding extraction.
///
/// Faces are returned in the encoder's scan order. Implementations may hold
/// inference sessions, hence `&mut self`.
pub trait FaceEncoder: Send {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedFace>, Box<dyn std::error::Error>>;
}
