pub mod frame_decoder;
pub mod http_camera;
