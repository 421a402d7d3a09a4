//! Cooperative scheduler: one `tick` runs every gated task once.
//!
//! Nothing here blocks. Each task checks its own [`TimerGate`](crate::TimerGate)
//! and returns immediately when its interval has not elapsed, so the caller
//! can spin `tick` as fast as it likes.

use crate::comm_manager::{CommConfig, CommunicationManager, LinkHealth};
use crate::data_manager::{DataConfig, DataManager};
use crate::flight_mode::{ArmingLatch, FlightMode};
use crate::gps::NmeaDecoder;
use crate::sensors::{Barometer, BatterySense};
use crate::time::Millis;
use crate::transport::{ByteSource, LineSink};

/// Borrowed peripherals for one tick.
pub struct Io<'a, B, V, G, U, L> {
    pub barometer: &'a mut B,
    pub battery: &'a mut V,
    /// Raw NMEA bytes from the GPS receiver.
    pub gps_rx: &'a mut G,
    /// Command bytes from the ground station.
    pub uplink: &'a mut U,
    pub downlink: &'a mut L,
}

/// Which gated tasks fired during a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub gps_bytes: usize,
    pub uplink_bytes: usize,
    pub battery: bool,
    pub barometer: bool,
    pub gps_altitude: bool,
    pub fusion: bool,
    pub telemetry: bool,
    pub status: bool,
}

pub struct FlightLoop<M: FlightMode = ArmingLatch> {
    pub data: DataManager,
    pub comms: CommunicationManager,
    pub gps: NmeaDecoder,
    pub mode: M,
}

impl<M: FlightMode> FlightLoop<M> {
    pub fn new(data: DataConfig, comms: CommConfig, mode: M) -> Self {
        Self {
            data: DataManager::new(data),
            comms: CommunicationManager::new(comms),
            gps: NmeaDecoder::new(),
            mode,
        }
    }

    pub fn setup<B: Barometer>(&mut self, barometer: &mut B) {
        self.data.setup_barometer(barometer);
        info!("flight loop ready");
    }

    /// Drains input, samples sensors, fuses, then emits whatever lines are due.
    pub fn tick<B, V, G, U, L>(&mut self, now: Millis, io: Io<'_, B, V, G, U, L>) -> TickReport
    where
        B: Barometer,
        V: BatterySense,
        G: ByteSource,
        U: ByteSource,
        L: LineSink,
    {
        let gps_bytes = self.comms.process_gps_serial(now, io.gps_rx, &mut self.gps);
        let uplink_bytes = self.comms.process_gc_serial(now, io.uplink, &mut self.mode);

        let battery = self.data.update_battery(now, io.battery);
        let barometer = self.data.update_barometer(now, io.barometer);
        let gps_altitude = self.data.update_gps_altitude(now, &self.gps);
        let fusion = self.data.calculate_location(now);

        let telemetry = self.comms.transmit_telemetry(now, &self.gps, io.downlink);
        let status = self.comms.transmit_status(now, &self.gps, &self.data, io.downlink);

        TickReport {
            gps_bytes,
            uplink_bytes,
            battery,
            barometer,
            gps_altitude,
            fusion,
            telemetry,
            status,
        }
    }

    pub fn link_health(&self, now: Millis) -> LinkHealth {
        self.comms.link_health(now)
    }
}

impl Default for FlightLoop {
    fn default() -> Self {
        Self::new(DataConfig::default(), CommConfig::default(), ArmingLatch::default())
    }
}
