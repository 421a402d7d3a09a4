use core::str::FromStr;

use crate::sensors::{GpsField, GpsReadings, Location, SentenceCounters};
use crate::time::Millis;

/// NMEA caps sentences at 82 chars; leave some headroom for chatty receivers.
const SENTENCE_CAPACITY: usize = 96;
const KNOTS_TO_KMPH: f32 = 1.852;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaFrame {
    Gga,
    Rmc,
    /// Checksum passed but the sentence type is not decoded.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaError {
    TooShort,
    Overflow,
    MissingChecksum,
    BadChecksum,
}

/// Byte-at-a-time NMEA decoder (GGA + RMC).
///
/// Every field keeps its own validity and commit time, so consumers can ask
/// how old a location or altitude is. Fields are only committed from
/// sentences whose checksum verifies; position-type fields additionally need
/// the sentence to report a fix.
pub struct NmeaDecoder {
    buffer: heapless::String<SENTENCE_CAPACITY>,

    // ── Navigation ──
    location: GpsField<Location>,
    altitude: GpsField<f32>, // metres MSL
    speed: GpsField<f32>,    // km/h
    course: GpsField<f32>,   // degrees
    time: GpsField<u32>,     // hhmmsscc

    // ── Quality ──
    satellites: GpsField<u32>,
    hdop: GpsField<u32>, // x100

    // ── Diagnostics ──
    counters: SentenceCounters,
    frame_errors: u32,
    unknown_sentences: u32,
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
            location: GpsField::invalid(Location::default()),
            altitude: GpsField::invalid(0.0),
            speed: GpsField::invalid(0.0),
            course: GpsField::invalid(0.0),
            time: GpsField::invalid(0),
            satellites: GpsField::invalid(0),
            hdop: GpsField::invalid(0),
            counters: SentenceCounters::default(),
            frame_errors: 0,
            unknown_sentences: 0,
        }
    }

    /// Feed one received byte. Returns the sentence type when a complete,
    /// checksum-valid sentence has just been committed.
    pub fn encode(&mut self, byte: u8, now: Millis) -> Option<NmeaFrame> {
        match byte {
            b'$' => {
                self.buffer.clear();
                let _ = self.buffer.push('$');
                None
            }
            b'\n' => {
                if self.buffer.is_empty() {
                    return None;
                }
                match self.finish_sentence(now) {
                    Ok(frame) => Some(frame),
                    Err(e) => {
                        self.record_error(e);
                        None
                    }
                }
            }
            _ => {
                // Noise between sentences, or the tail of an overflowed one
                if self.buffer.is_empty() {
                    return None;
                }
                if self.buffer.push(byte as char).is_err() {
                    self.record_error(NmeaError::Overflow);
                    self.buffer.clear();
                }
                None
            }
        }
    }

    /// Feed a burst of bytes; returns how many sentences were committed.
    pub fn encode_all(&mut self, bytes: &[u8], now: Millis) -> usize {
        bytes
            .iter()
            .filter(|&&b| self.encode(b, now).is_some())
            .count()
    }

    pub fn frame_errors(&self) -> u32 {
        self.frame_errors
    }

    pub fn unknown_sentences(&self) -> u32 {
        self.unknown_sentences
    }

    fn record_error(&mut self, err: NmeaError) {
        match err {
            NmeaError::TooShort | NmeaError::Overflow => {
                self.frame_errors = self.frame_errors.wrapping_add(1);
            }
            NmeaError::MissingChecksum | NmeaError::BadChecksum => {
                self.counters.failed_checksum = self.counters.failed_checksum.wrapping_add(1);
            }
        }
        debug!("nmea: dropped sentence ({})", err);
    }

    fn finish_sentence(&mut self, now: Millis) -> Result<NmeaFrame, NmeaError> {
        let sentence = core::mem::take(&mut self.buffer);
        let s = sentence.trim();

        if s.len() < 6 {
            return Err(NmeaError::TooShort);
        }

        let body = checksum_body(s)?;
        self.counters.passed_checksum = self.counters.passed_checksum.wrapping_add(1);

        let mut parts = body.split(',');
        // Talker ID (GP, GN, GL…) followed by the sentence type
        let frame = match parts.next().and_then(|id| id.get(2..)) {
            Some("GGA") => NmeaFrame::Gga,
            Some("RMC") => NmeaFrame::Rmc,
            _ => NmeaFrame::Other,
        };

        match frame {
            NmeaFrame::Gga => self.parse_gga(parts, now),
            NmeaFrame::Rmc => self.parse_rmc(parts, now),
            NmeaFrame::Other => {
                self.unknown_sentences = self.unknown_sentences.wrapping_add(1);
            }
        }
        Ok(frame)
    }

    // ────── GGA ──────
    fn parse_gga<'a>(&mut self, mut parts: impl Iterator<Item = &'a str>, now: Millis) {
        // time,lat,NS,lon,EW,qual,sats,hdop,alt,M,…
        let time_str = parts.next().unwrap_or("");
        let lat_raw = parts.next().unwrap_or("");
        let ns = parts.next().unwrap_or("");
        let lon_raw = parts.next().unwrap_or("");
        let ew = parts.next().unwrap_or("");
        let qual_str = parts.next().unwrap_or("");
        let sats_str = parts.next().unwrap_or("");
        let hdop_str = parts.next().unwrap_or("");
        let alt_str = parts.next().unwrap_or("");

        let has_fix = u8::from_str(qual_str).map(|q| q > 0).unwrap_or(false);

        if let Some(t) = parse_time(time_str) {
            self.time = GpsField::committed(t, now);
        }
        if let Ok(n) = u32::from_str(sats_str) {
            self.satellites = GpsField::committed(n, now);
        }
        if let Some(h) = parse_hundredths(hdop_str) {
            self.hdop = GpsField::committed(h, now);
        }

        if has_fix {
            self.counters.with_fix = self.counters.with_fix.wrapping_add(1);
            if let Some(loc) = parse_location(lat_raw, ns, lon_raw, ew) {
                self.location = GpsField::committed(loc, now);
            }
            if let Ok(a) = f32::from_str(alt_str) {
                self.altitude = GpsField::committed(a, now);
            }
        }
    }

    // ────── RMC ──────
    fn parse_rmc<'a>(&mut self, mut parts: impl Iterator<Item = &'a str>, now: Millis) {
        // time,status,lat,NS,lon,EW,speed(kn),course,date,…
        let time_str = parts.next().unwrap_or("");
        let status = parts.next().unwrap_or("");
        let lat_raw = parts.next().unwrap_or("");
        let ns = parts.next().unwrap_or("");
        let lon_raw = parts.next().unwrap_or("");
        let ew = parts.next().unwrap_or("");
        let speed_raw = parts.next().unwrap_or("");
        let course_raw = parts.next().unwrap_or("");

        if let Some(t) = parse_time(time_str) {
            self.time = GpsField::committed(t, now);
        }

        // A = active, V = void
        if status == "A" {
            self.counters.with_fix = self.counters.with_fix.wrapping_add(1);
            if let Some(loc) = parse_location(lat_raw, ns, lon_raw, ew) {
                self.location = GpsField::committed(loc, now);
            }
            if let Ok(knots) = f32::from_str(speed_raw) {
                self.speed = GpsField::committed(knots * KNOTS_TO_KMPH, now);
            }
            if let Ok(crs) = f32::from_str(course_raw) {
                self.course = GpsField::committed(crs, now);
            }
        }
    }
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GpsReadings for NmeaDecoder {
    fn location(&self) -> GpsField<Location> {
        self.location
    }

    fn altitude_m(&self) -> GpsField<f32> {
        self.altitude
    }

    fn speed_kmph(&self) -> GpsField<f32> {
        self.speed
    }

    fn course_deg(&self) -> GpsField<f32> {
        self.course
    }

    fn time(&self) -> GpsField<u32> {
        self.time
    }

    fn satellites(&self) -> u32 {
        self.satellites.value
    }

    fn hdop(&self) -> u32 {
        self.hdop.value
    }

    fn counters(&self) -> SentenceCounters {
        self.counters
    }
}

/// Verifies the `*hh` XOR checksum and returns the text between `$` and `*`.
pub fn checksum_body(s: &str) -> Result<&str, NmeaError> {
    let s = s.strip_prefix('$').unwrap_or(s);
    let (content, check_str) = s.split_once('*').ok_or(NmeaError::MissingChecksum)?;

    let calc = content.bytes().fold(0u8, |acc, b| acc ^ b);
    // Only the first two hex chars; anything after is line noise
    let hex = check_str.get(..2).ok_or(NmeaError::MissingChecksum)?;
    let expected = u8::from_str_radix(hex, 16).map_err(|_| NmeaError::MissingChecksum)?;

    if calc == expected {
        Ok(content)
    } else {
        Err(NmeaError::BadChecksum)
    }
}

/// `hhmmss[.ss]` → hhmmsscc
fn parse_time(s: &str) -> Option<u32> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.len() != 6 {
        return None;
    }
    let hhmmss = u32::from_str(whole).ok()?;

    let mut cc = 0u32;
    let mut scale = 10;
    for b in frac.bytes().take(2) {
        if !b.is_ascii_digit() {
            return None;
        }
        cc += (b - b'0') as u32 * scale;
        scale /= 10;
    }
    Some(hhmmss * 100 + cc)
}

/// Decimal field → integer hundredths (`"0.9"` → 90).
fn parse_hundredths(s: &str) -> Option<u32> {
    let v = f32::from_str(s).ok()?;
    if v < 0.0 {
        return None;
    }
    Some((v * 100.0 + 0.5) as u32)
}

/// `dddmm.mmmm` + hemisphere → signed decimal degrees.
fn parse_coordinate(raw: &str, hemisphere: &str) -> Option<f64> {
    let value = f64::from_str(raw).ok()?;
    let whole = u32::from_str(raw.split('.').next()?).ok()?;

    let degrees = (whole / 100) as f64;
    let minutes = value - degrees * 100.0;
    let coord = degrees + minutes / 60.0;

    match hemisphere {
        "N" | "E" => Some(coord),
        "S" | "W" => Some(-coord),
        _ => None,
    }
}

fn parse_location(lat_raw: &str, ns: &str, lon_raw: &str, ew: &str) -> Option<Location> {
    Some(Location {
        lat: parse_coordinate(lat_raw, ns)?,
        lng: parse_coordinate(lon_raw, ew)?,
    })
}

#[cfg(test)]
mod tests;
