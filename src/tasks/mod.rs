pub mod baro_task;
pub mod downlink_task;
pub mod serial_rx;
