pub mod model_resolver;
pub mod onnx_face_encoder;
pub mod roster_loader;
