//! Face encoder backed by two ONNX Runtime sessions.
//!
//! A YOLO face model locates faces (letterbox preprocessing, confidence
//! filtering, NMS) and an ArcFace model turns each face crop into an
//! L2-normalized embedding.
use std::path::Path;

use ndarray::Array1;

use crate::recognition::domain::face_encoder::{EncodedFace, FaceEncoder};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

const EMBED_INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxFaceEncoder {
    detector: ort::session::Session,
    embedder: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceEncoder {
    /// Load both models. The detector's input resolution is read from its
    /// NCHW input shape, falling back to 640 when the shape is dynamic.
    pub fn new(
        detector_model: &Path,
        embedding_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(detector_model)?;

        let input_size = detector
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let embedder = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(embedding_model)?;

        Ok(Self {
            detector,
            embedder,
            confidence,
            input_size,
        })
    }

    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.detector.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected face model output shape: {shape:?}").into());
        }

        // Output is [1, features, detections] or [1, detections, features].
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Ok(Vec::new());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let at = |det: usize, feat: usize| -> f64 {
            if transposed {
                data[feat * num_dets + det] as f64
            } else {
                data[det * num_feats + feat] as f64
            }
        };

        let mut raw = Vec::new();
        for i in 0..num_dets {
            let conf = at(i, 4);
            if conf < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (at(i, 0), at(i, 1), at(i, 2), at(i, 3));
            raw.push(RawDetection {
                x1: ((cx - w / 2.0) - pad_x as f64) / scale,
                y1: ((cy - h / 2.0) - pad_y as f64) / scale,
                x2: ((cx + w / 2.0) - pad_x as f64) / scale,
                y2: ((cy + h / 2.0) - pad_y as f64) / scale,
                confidence: conf,
            });
        }

        // NMS reorders by confidence; restore scan order (top-to-bottom,
        // left-to-right) for stable output.
        let mut kept = nms(&mut raw, NMS_IOU_THRESH);
        kept.sort_by(|a, b| {
            (a.y1, a.x1)
                .partial_cmp(&(b.y1, b.x1))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(kept
            .iter()
            .map(|d| FaceBox::from_corners(d.x1, d.y1, d.x2, d.y2, frame.width(), frame.height()))
            .filter(|b| !b.is_empty())
            .collect())
    }

    fn embed(
        &mut self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<Array1<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess_crop(frame, face);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.embedder.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("embedding model produced no outputs".into());
        }
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;
        normalized_embedding(embedding_slice)
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedFace>, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }
        let boxes = self.locate(frame)?;
        let mut faces = Vec::with_capacity(boxes.len());
        for face_box in boxes {
            let embedding = self.embed(frame, &face_box)?;
            faces.push(EncodedFace {
                face_box,
                embedding,
            });
        }
        Ok(faces)
    }
}

/// CoreML on macOS, DirectML on Windows, ONNX Runtime's CPU default elsewhere.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    let providers = vec![ort::execution_providers::CoreMLExecutionProvider::default().build()];
    #[cfg(target_os = "windows")]
    let providers = vec![ort::execution_providers::DirectMLExecutionProvider::default().build()];
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let providers = Vec::new();
    providers
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

/// Sample the face crop to 112x112, normalize, NCHW layout.
fn preprocess_crop(frame: &Frame, face: &FaceBox) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let max_x = frame.width().saturating_sub(1) as usize;
    let max_y = frame.height().saturating_sub(1) as usize;
    let crop_w = face.width().max(1) as f64;
    let crop_h = face.height().max(1) as f64;

    let mut tensor =
        ndarray::Array4::<f32>::zeros((1, 3, EMBED_INPUT_SIZE, EMBED_INPUT_SIZE));

    for y in 0..EMBED_INPUT_SIZE {
        let offset_y = (y as f64 + 0.5) * crop_h / EMBED_INPUT_SIZE as f64;
        let src_y = ((face.top.max(0) as f64 + offset_y) as usize).min(max_y);
        for x in 0..EMBED_INPUT_SIZE {
            let offset_x = (x as f64 + 0.5) * crop_w / EMBED_INPUT_SIZE as f64;
            let src_x = ((face.left.max(0) as f64 + offset_x) as usize).min(max_x);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

/// Copies raw model output into a unit-length embedding. Empty or
/// non-finite output is an error, so matching never sees a degenerate vector.
fn normalized_embedding(raw: &[f32]) -> Result<Array1<f32>, Box<dyn std::error::Error>> {
    if raw.is_empty() {
        return Err("embedding model returned an empty vector".into());
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err("embedding model returned non-finite values".into());
    }
    let mut embedding = raw.to_vec();
    l2_normalize(&mut embedding);
    Ok(Array1::from_vec(embedding))
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] {
                continue;
            }
            let iou = bbox_iou(
                &[dets[i].x1, dets[i].y1, dets[i].x2, dets[i].y2],
                &[dets[j].x1, dets[j].y1, dets[j].x2, dets[j].y2],
            );
            if iou > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}
