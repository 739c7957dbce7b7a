pub mod access_control_system;
pub mod config;
