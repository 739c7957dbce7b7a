pub mod http_actuator;
