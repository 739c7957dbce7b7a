pub mod actuator;
pub mod notification_event;
