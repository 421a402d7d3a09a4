//! Typed readings and the collaborator interfaces the sampling tasks consume.
//!
//! Drivers live outside this crate (or in the firmware binary); they only
//! need to implement [`Barometer`], [`BatterySense`] and [`GpsReadings`].

use core::fmt;

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::time::{elapsed, Millis};

/// Standard sea-level pressure used by the hypsometric formula.
pub const SEA_LEVEL_PA: f32 = 101_325.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Driver not started, bus error or no sample produced yet.
    Unavailable,
    /// A sample arrived but is out of range or too old to trust.
    InvalidReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Unavailable => f.write_str("sensor unavailable"),
            SensorError::InvalidReading => f.write_str("invalid sensor reading"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaroReading {
    pub altitude_m: f32,
    pub temperature_c: f32,
    /// When the conversion was taken, not when it was read back.
    pub measured_at: Millis,
}

pub trait Barometer {
    fn begin(&mut self) -> Result<(), SensorError>;
    fn read(&mut self) -> Result<BaroReading, SensorError>;
}

/// Raw ADC access to the battery-sense divider.
pub trait BatterySense {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Pressure altitude (m) from static pressure (Pa).
/// Alt = 44330 * (1 - (P / P0)^(1/5.255))
pub fn pressure_altitude_m(pressure_pa: f32, sea_level_pa: f32) -> f32 {
    44330.0 * (1.0 - (pressure_pa / sea_level_pa).powf(1.0 / 5.255))
}

#[inline]
pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 1.8 + 32.0
}

/// One GPS quantity together with its validity and the time it was last
/// committed by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsField<T> {
    pub value: T,
    pub valid: bool,
    pub updated_at: Millis,
}

impl<T: Copy> GpsField<T> {
    pub const fn invalid(value: T) -> Self {
        Self {
            value,
            valid: false,
            updated_at: 0,
        }
    }

    pub const fn committed(value: T, now: Millis) -> Self {
        Self {
            value,
            valid: true,
            updated_at: now,
        }
    }

    /// Milliseconds since the last valid update, `None` if never valid.
    pub fn age(&self, now: Millis) -> Option<Millis> {
        self.valid.then(|| elapsed(now, self.updated_at))
    }

    /// The value, if valid and younger than `max_age`.
    pub fn fresh(&self, now: Millis, max_age: Millis) -> Option<T> {
        match self.age(now) {
            Some(age) if age < max_age => Some(self.value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Cumulative sentence counters kept by the GPS decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SentenceCounters {
    pub with_fix: u32,
    pub passed_checksum: u32,
    pub failed_checksum: u32,
}

/// Snapshot view of a GPS sentence decoder.
pub trait GpsReadings {
    fn location(&self) -> GpsField<Location>;
    fn altitude_m(&self) -> GpsField<f32>;
    fn speed_kmph(&self) -> GpsField<f32>;
    fn course_deg(&self) -> GpsField<f32>;
    /// UTC time as hhmmsscc.
    fn time(&self) -> GpsField<u32>;
    fn satellites(&self) -> u32;
    /// Horizontal dilution of precision, x100.
    fn hdop(&self) -> u32;
    fn counters(&self) -> SentenceCounters;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_age_none_until_valid() {
        let f = GpsField::invalid(0.0f32);
        assert_eq!(f.age(5_000), None);
        assert_eq!(f.fresh(5_000, 10_000), None);
    }

    #[test]
    fn test_field_freshness_cutoff() {
        let f = GpsField::committed(42.0f32, 1_000);
        assert_eq!(f.age(4_000), Some(3_000));
        assert_eq!(f.fresh(10_999, 10_000), Some(42.0));
        assert_eq!(f.fresh(11_000, 10_000), None);
    }

    #[test]
    fn test_field_age_wraps() {
        let f = GpsField::committed(1u32, u32::MAX - 499);
        assert_eq!(f.age(500), Some(1_000));
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 1e-3);
        assert!((celsius_to_fahrenheit(-40.0) + 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_pressure_altitude() {
        assert!(pressure_altitude_m(SEA_LEVEL_PA, SEA_LEVEL_PA).abs() < 0.01);
        // ~1000 m at 89874.6 Pa in the standard atmosphere
        let alt = pressure_altitude_m(89_874.6, SEA_LEVEL_PA);
        assert!((alt - 1000.0).abs() < 5.0, "alt = {}", alt);
    }
}
