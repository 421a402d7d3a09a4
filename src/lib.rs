//! Flight-computer core: time-gated sensor sampling, running averages and the
//! line-oriented telemetry/status link to the ground station.
//!
//! Everything in here is platform independent and `no_std`. The STM32
//! firmware in `main.rs` plugs real peripherals into the traits in
//! [`sensors`] and [`transport`] and calls [`FlightLoop::tick`] forever.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod macros;

pub mod comm_manager;
pub mod data_manager;
pub mod flight_loop;
pub mod flight_mode;
pub mod gps;
pub mod protocol;
pub mod running_average;
pub mod sensors;
pub mod time;
pub mod transport;

pub use comm_manager::{CommConfig, CommunicationManager, LinkHealth, LinkStats};
pub use data_manager::{DataConfig, DataManager, SensorStats};
pub use flight_loop::{FlightLoop, Io, TickReport};
pub use flight_mode::{ArmingLatch, FlightMode};
pub use gps::NmeaDecoder;
pub use protocol::{
    AgeField, DeltaCounters, GroundCommand, Line, Packet, ProtocolError, StatusPacket,
    TelemetryPacket,
};
pub use running_average::{RunningAverage, Sample};
pub use sensors::{
    BaroReading, Barometer, BatterySense, GpsField, GpsReadings, Location, SensorError,
    SentenceCounters,
};
pub use time::{elapsed, Millis, TimerGate};
pub use transport::{ByteSource, LineSink, LinkError};
