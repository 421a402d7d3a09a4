use crate::data_manager::{DataManager, STALE_AFTER_MS};
use crate::flight_mode::FlightMode;
use crate::gps::NmeaDecoder;
use crate::protocol::{
    AgeField, DeltaCounters, GroundCommand, Line, ProtocolError, StatusPacket, TelemetryPacket,
};
use crate::sensors::{GpsReadings, SentenceCounters};
use crate::time::{elapsed, Millis, TimerGate};
use crate::transport::{ByteSource, LineSink};

/// Telemetry (position) line cadence.
pub const TELEMETRY_INTERVAL_MS: Millis = 1111;
/// Status (integrity) line cadence.
pub const STATUS_INTERVAL_MS: Millis = 2222;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommConfig {
    pub telemetry_interval_ms: Millis,
    pub status_interval_ms: Millis,
    /// Ages at or above this print as `X`.
    pub stale_after_ms: Millis,
}

impl Default for CommConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: TELEMETRY_INTERVAL_MS,
            status_interval_ms: STATUS_INTERVAL_MS,
            stale_after_ms: STALE_AFTER_MS,
        }
    }
}

/// Ground-link liveness, as judged from the last ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkHealth {
    NeverContacted,
    Fresh,
    Stale,
}

impl LinkHealth {
    /// Status LED level at `now`: solid when the link is fresh, 1 Hz blink
    /// when stale, 4 Hz blink before first contact.
    pub fn indicator(self, now: Millis) -> bool {
        match self {
            LinkHealth::Fresh => true,
            LinkHealth::Stale => (now / 500) % 2 == 0,
            LinkHealth::NeverContacted => (now / 125) % 2 == 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub pings: u32,
    pub arms: u32,
    /// Arm requests received outside pre-arm.
    pub rejected_arms: u32,
    /// Uplink bytes that are not a known command.
    pub malformed_commands: u32,
    pub telemetry_sent: u32,
    pub status_sent: u32,
    /// Lines that could not be formatted or queued.
    pub dropped_lines: u32,
}

/// Drives the ground link: outbound cadence, inbound commands, GPS intake.
pub struct CommunicationManager {
    config: CommConfig,
    telemetry_gate: TimerGate,
    status_gate: TimerGate,
    last_rx: Option<Millis>,
    /// Counter values at the previous status line.
    baseline: SentenceCounters,
    stats: LinkStats,
}

impl CommunicationManager {
    pub fn new(config: CommConfig) -> Self {
        Self {
            telemetry_gate: TimerGate::new(config.telemetry_interval_ms),
            status_gate: TimerGate::new(config.status_interval_ms),
            config,
            last_rx: None,
            baseline: SentenceCounters::default(),
            stats: LinkStats::default(),
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn last_rx(&self) -> Option<Millis> {
        self.last_rx
    }

    pub fn link_health(&self, now: Millis) -> LinkHealth {
        match self.last_rx {
            None => LinkHealth::NeverContacted,
            Some(t) if elapsed(now, t) < self.config.stale_after_ms => LinkHealth::Fresh,
            Some(_) => LinkHealth::Stale,
        }
    }

    // ── Outbound ──────────────────────────────────────────────────────────────

    pub fn telemetry_packet<G: GpsReadings>(gps: &G) -> TelemetryPacket {
        let location = gps.location().value;
        TelemetryPacket {
            latitude: location.lat,
            longitude: location.lng,
            altitude_m: gps.altitude_m().value,
            speed_kmph: gps.speed_kmph().value,
        }
    }

    /// Builds the status packet for `now` without touching the counter
    /// baseline.
    pub fn status_packet<G: GpsReadings>(
        &self,
        now: Millis,
        gps: &G,
        data: &DataManager,
    ) -> StatusPacket {
        let stale = self.config.stale_after_ms;
        let uplink_age = self.last_rx.map(|t| elapsed(now, t));
        StatusPacket {
            gps_time: gps.time().value,
            uplink_age: AgeField::from_age(uplink_age, stale),
            time_age: AgeField::from_age(gps.time().age(now), stale),
            location_age: AgeField::from_age(gps.location().age(now), stale),
            altitude_age: AgeField::from_age(gps.altitude_m().age(now), stale),
            speed_age: AgeField::from_age(gps.speed_kmph().age(now), stale),
            course_age: AgeField::from_age(gps.course_deg().age(now), stale),
            satellites: gps.satellites(),
            hdop: gps.hdop(),
            battery_centivolts: data.average_battery(),
            counters: DeltaCounters::between(self.baseline, gps.counters()),
        }
    }

    pub fn transmit_telemetry<G: GpsReadings, L: LineSink>(
        &mut self,
        now: Millis,
        gps: &G,
        link: &mut L,
    ) -> bool {
        if !self.telemetry_gate.poll(now) {
            return false;
        }
        let packet = Self::telemetry_packet(gps);
        if self.send(packet.to_line(), link) {
            self.stats.telemetry_sent = self.stats.telemetry_sent.wrapping_add(1);
        }
        true
    }

    pub fn transmit_status<G: GpsReadings, L: LineSink>(
        &mut self,
        now: Millis,
        gps: &G,
        data: &DataManager,
        link: &mut L,
    ) -> bool {
        if !self.status_gate.poll(now) {
            return false;
        }
        let packet = self.status_packet(now, gps, data);
        if self.send(packet.to_line(), link) {
            self.stats.status_sent = self.stats.status_sent.wrapping_add(1);
        }
        // Rebase even if the line was dropped; the next deltas cover only
        // the next window.
        self.baseline = gps.counters();
        true
    }

    fn send<L: LineSink>(&mut self, line: Result<Line, ProtocolError>, link: &mut L) -> bool {
        let result = match line {
            Ok(line) => link.send_line(line.as_str()).map_err(|e| {
                warn!("downlink: line dropped ({})", e);
            }),
            Err(e) => {
                warn!("downlink: format failed ({})", e);
                Err(())
            }
        };
        if result.is_err() {
            self.stats.dropped_lines = self.stats.dropped_lines.wrapping_add(1);
        }
        result.is_ok()
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// Feeds every buffered GPS byte into the decoder. Returns bytes consumed.
    pub fn process_gps_serial<S: ByteSource>(
        &mut self,
        now: Millis,
        source: &mut S,
        decoder: &mut NmeaDecoder,
    ) -> usize {
        let mut count = 0;
        while let Some(b) = source.read_byte() {
            decoder.encode(b, now);
            count += 1;
        }
        count
    }

    /// Handles every buffered uplink byte as an independent command.
    /// Returns bytes consumed.
    pub fn process_gc_serial<S: ByteSource, M: FlightMode>(
        &mut self,
        now: Millis,
        source: &mut S,
        mode: &mut M,
    ) -> usize {
        let mut count = 0;
        while let Some(b) = source.read_byte() {
            self.handle_command(now, GroundCommand::from_byte(b), mode);
            count += 1;
        }
        count
    }

    pub fn handle_command<M: FlightMode>(
        &mut self,
        now: Millis,
        command: GroundCommand,
        mode: &mut M,
    ) {
        match command {
            GroundCommand::Ping => {
                self.last_rx = Some(now);
                self.stats.pings = self.stats.pings.wrapping_add(1);
            }
            GroundCommand::Arm if mode.is_prearm() => {
                mode.arm();
                self.stats.arms = self.stats.arms.wrapping_add(1);
            }
            GroundCommand::Arm => {
                self.stats.rejected_arms = self.stats.rejected_arms.wrapping_add(1);
                warn!("uplink: arm ignored, not in pre-arm");
            }
            GroundCommand::Unknown(b) => {
                self.stats.malformed_commands = self.stats.malformed_commands.wrapping_add(1);
                warn!("uplink: unknown command byte {=u8:#x}", b);
            }
        }
    }
}

impl Default for CommunicationManager {
    fn default() -> Self {
        Self::new(CommConfig::default())
    }
}
