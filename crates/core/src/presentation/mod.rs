pub mod decision_edge;
pub mod frame_rate;
pub mod frame_renderer;
pub mod presentation_loop;
