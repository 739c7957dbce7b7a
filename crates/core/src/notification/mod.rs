pub mod domain;
pub mod infrastructure;
pub mod notification_dispatcher;
