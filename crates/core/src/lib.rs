pub mod acquisition;
pub mod notification;
pub mod presentation;
pub mod recognition;
pub mod runtime;
pub mod shared;
pub mod state;
