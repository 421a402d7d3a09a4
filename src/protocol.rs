//! Ground-link wire format.
//!
//! Downlink lines are ASCII, comma separated and `\r\n` terminated:
//!
//! ```text
//! T,44.982719,-123.337142,98.50,1.17
//! S,21594500,0,0,0,0,1,X,6,165,532,2/1/0
//! ```
//!
//! Uplink commands are single bytes, see [`GroundCommand`].

use core::fmt::{self, Write};
use core::str::FromStr;

use crate::sensors::SentenceCounters;
use crate::time::Millis;

pub const LINE_CAPACITY: usize = 128;

/// One formatted downlink line, terminator included.
pub type Line = heapless::String<LINE_CAPACITY>;

const INVALID_MARKER: &str = "X";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    Empty,
    UnknownTag,
    FieldCount { expected: u8, found: u8 },
    BadNumber,
    BadAge,
    BadCounters,
    LineTooLong,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Empty => f.write_str("empty line"),
            ProtocolError::UnknownTag => f.write_str("unknown packet tag"),
            ProtocolError::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            ProtocolError::BadNumber => f.write_str("malformed number"),
            ProtocolError::BadAge => f.write_str("malformed age field"),
            ProtocolError::BadCounters => f.write_str("malformed counter triple"),
            ProtocolError::LineTooLong => f.write_str("line exceeds buffer"),
        }
    }
}

// ── Ground commands ─────────────────────────────────────────────────────────

/// Single-byte uplink command. Every byte is classified on its own; there is
/// no framing state to lose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GroundCommand {
    Ping,
    Arm,
    Unknown(u8),
}

impl GroundCommand {
    pub const PING: u8 = b'P';
    pub const ARM: u8 = b'A';

    pub const fn from_byte(b: u8) -> Self {
        match b {
            Self::PING => GroundCommand::Ping,
            Self::ARM => GroundCommand::Arm,
            other => GroundCommand::Unknown(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            GroundCommand::Ping => Self::PING,
            GroundCommand::Arm => Self::ARM,
            GroundCommand::Unknown(b) => b,
        }
    }
}

// ── Age fields ──────────────────────────────────────────────────────────────

/// Whole seconds since a field was updated, or `X` when unavailable/stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AgeField {
    Seconds(u16),
    Invalid,
}

impl AgeField {
    /// `age` of `None` (never valid) or at/over `stale_after` → `Invalid`.
    pub fn from_age(age: Option<Millis>, stale_after: Millis) -> Self {
        match age {
            Some(ms) if ms < stale_after => {
                AgeField::Seconds((ms / 1000).min(u16::MAX as u32) as u16)
            }
            _ => AgeField::Invalid,
        }
    }
}

impl fmt::Display for AgeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeField::Seconds(s) => write!(f, "{}", s),
            AgeField::Invalid => f.write_str(INVALID_MARKER),
        }
    }
}

impl FromStr for AgeField {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == INVALID_MARKER {
            return Ok(AgeField::Invalid);
        }
        u16::from_str(s)
            .map(AgeField::Seconds)
            .map_err(|_| ProtocolError::BadAge)
    }
}

// ── Telemetry ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryPacket {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f32,
    pub speed_kmph: f32,
}

impl TelemetryPacket {
    pub const TAG: &'static str = "T";
    const FIELDS: usize = 5;

    pub fn to_line(&self) -> Result<Line, ProtocolError> {
        let mut line = Line::new();
        writeln_crlf(&mut line, self)?;
        Ok(line)
    }

    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields::<{ TelemetryPacket::FIELDS }>(line, Self::TAG)?;
        Ok(Self {
            latitude: parse_num(fields[1])?,
            longitude: parse_num(fields[2])?,
            altitude_m: parse_num(fields[3])?,
            speed_kmph: parse_num(fields[4])?,
        })
    }
}

impl fmt::Display for TelemetryPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:.6},{:.6},{:.2},{:.2}",
            Self::TAG,
            self.latitude,
            self.longitude,
            self.altitude_m,
            self.speed_kmph
        )
    }
}

// ── Status ──────────────────────────────────────────────────────────────────

/// Sentence-counter deltas between two status packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeltaCounters {
    pub new_fix: u32,
    pub new_nofix: u32,
    pub new_badsum: u32,
}

impl DeltaCounters {
    /// new_fix = Δwith_fix, new_nofix = Δpassed − Δwith_fix, new_badsum = Δfailed.
    pub fn between(prev: SentenceCounters, cur: SentenceCounters) -> Self {
        let fix = cur.with_fix.wrapping_sub(prev.with_fix);
        let passed = cur.passed_checksum.wrapping_sub(prev.passed_checksum);
        Self {
            new_fix: fix,
            new_nofix: passed.saturating_sub(fix),
            new_badsum: cur.failed_checksum.wrapping_sub(prev.failed_checksum),
        }
    }
}

impl fmt::Display for DeltaCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.new_fix, self.new_nofix, self.new_badsum)
    }
}

impl FromStr for DeltaCounters {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let mut next = || {
            parts
                .next()
                .and_then(|p| u32::from_str(p).ok())
                .ok_or(ProtocolError::BadCounters)
        };
        let counters = Self {
            new_fix: next()?,
            new_nofix: next()?,
            new_badsum: next()?,
        };
        if parts.next().is_some() {
            return Err(ProtocolError::BadCounters);
        }
        Ok(counters)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusPacket {
    pub gps_time: u32,
    pub uplink_age: AgeField,
    pub time_age: AgeField,
    pub location_age: AgeField,
    pub altitude_age: AgeField,
    pub speed_age: AgeField,
    pub course_age: AgeField,
    pub satellites: u32,
    pub hdop: u32,
    /// `None` until the first battery sample.
    pub battery_centivolts: Option<u16>,
    pub counters: DeltaCounters,
}

impl StatusPacket {
    pub const TAG: &'static str = "S";
    const FIELDS: usize = 12;

    pub fn to_line(&self) -> Result<Line, ProtocolError> {
        let mut line = Line::new();
        writeln_crlf(&mut line, self)?;
        Ok(line)
    }

    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let f = split_fields::<{ StatusPacket::FIELDS }>(line, Self::TAG)?;
        let battery_centivolts = match f[10] {
            INVALID_MARKER => None,
            v => Some(parse_num(v)?),
        };
        Ok(Self {
            gps_time: parse_num(f[1])?,
            uplink_age: f[2].parse()?,
            time_age: f[3].parse()?,
            location_age: f[4].parse()?,
            altitude_age: f[5].parse()?,
            speed_age: f[6].parse()?,
            course_age: f[7].parse()?,
            satellites: parse_num(f[8])?,
            hdop: parse_num(f[9])?,
            battery_centivolts,
            counters: f[11].parse()?,
        })
    }
}

impl fmt::Display for StatusPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{},",
            Self::TAG,
            self.gps_time,
            self.uplink_age,
            self.time_age,
            self.location_age,
            self.altitude_age,
            self.speed_age,
            self.course_age,
            self.satellites,
            self.hdop,
        )?;
        match self.battery_centivolts {
            Some(cv) => write!(f, "{}", cv)?,
            None => f.write_str(INVALID_MARKER)?,
        }
        write!(f, ",{}", self.counters)
    }
}

// ── Any downlink packet ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Packet {
    Telemetry(TelemetryPacket),
    Status(StatusPacket),
}

impl Packet {
    /// Dispatches on the leading tag field.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end();
        match line.split(',').next() {
            Some("") | None => Err(ProtocolError::Empty),
            Some(TelemetryPacket::TAG) => TelemetryPacket::parse(line).map(Packet::Telemetry),
            Some(StatusPacket::TAG) => StatusPacket::parse(line).map(Packet::Status),
            Some(_) => Err(ProtocolError::UnknownTag),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn writeln_crlf(line: &mut Line, packet: &impl fmt::Display) -> Result<(), ProtocolError> {
    write!(line, "{}\r\n", packet).map_err(|_| ProtocolError::LineTooLong)
}

fn split_fields<'a, const N: usize>(
    line: &'a str,
    tag: &str,
) -> Result<[&'a str; N], ProtocolError> {
    let line = line.trim_end();
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let mut fields = [""; N];
    let mut found = 0usize;
    for (i, part) in line.split(',').enumerate() {
        if i < N {
            fields[i] = part;
        }
        found += 1;
    }

    if fields[0] != tag {
        return Err(ProtocolError::UnknownTag);
    }
    if found != N {
        return Err(ProtocolError::FieldCount {
            expected: N as u8,
            found: found.min(u8::MAX as usize) as u8,
        });
    }
    Ok(fields)
}

fn parse_num<T: FromStr>(s: &str) -> Result<T, ProtocolError> {
    T::from_str(s).map_err(|_| ProtocolError::BadNumber)
}

#[cfg(test)]
mod tests;
