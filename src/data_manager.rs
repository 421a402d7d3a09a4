use crate::running_average::RunningAverage;
use crate::sensors::{celsius_to_fahrenheit, Barometer, BatterySense, GpsReadings};
use crate::time::{elapsed, Millis, TimerGate};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// All sampling tasks run at most every 250 ms.
pub const UPDATE_INTERVAL_MS: Millis = 250;
/// Samples older than this are stale: excluded from fusion, `X` on the link.
pub const STALE_AFTER_MS: Millis = 10_000;

pub const BATTERY_WINDOW: usize = 10;
pub const SENSOR_WINDOW: usize = 4;

/// ADC reference voltage as measured on the board.
pub const ADC_REFERENCE_V: f32 = 5.015;
/// 10-bit conversion.
pub const ADC_FULL_SCALE: f32 = 1024.0;
/// Battery-sense resistor divider.
pub const DIVIDER_RATIO: f32 = 5.7;

/// Barometer share of the fused estimate when GPS is also fresh.
pub const FUSION_BARO_WEIGHT: f32 = 0.8;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataConfig {
    pub battery_interval_ms: Millis,
    pub barometer_interval_ms: Millis,
    pub gps_interval_ms: Millis,
    pub fusion_interval_ms: Millis,
    pub adc_reference_v: f32,
    pub adc_full_scale: f32,
    pub divider_ratio: f32,
    /// 0.0 = GPS only, 1.0 = barometer only.
    pub fusion_baro_weight: f32,
    pub stale_after_ms: Millis,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            battery_interval_ms: UPDATE_INTERVAL_MS,
            barometer_interval_ms: UPDATE_INTERVAL_MS,
            gps_interval_ms: UPDATE_INTERVAL_MS,
            fusion_interval_ms: UPDATE_INTERVAL_MS,
            adc_reference_v: ADC_REFERENCE_V,
            adc_full_scale: ADC_FULL_SCALE,
            divider_ratio: DIVIDER_RATIO,
            fusion_baro_weight: FUSION_BARO_WEIGHT,
            stale_after_ms: STALE_AFTER_MS,
        }
    }
}

impl DataConfig {
    /// Raw ADC count → battery centivolts, truncated toward zero.
    pub fn centivolts(&self, raw: u16) -> u16 {
        let volts = raw as f32 * self.adc_reference_v / self.adc_full_scale * self.divider_ratio;
        (volts * 100.0) as u16
    }

    /// Weighted blend of the two sources; either one alone passes through.
    pub fn fuse(&self, baro: Option<f32>, gps: Option<f32>) -> Option<f32> {
        let w = self.fusion_baro_weight.clamp(0.0, 1.0);
        match (baro, gps) {
            (Some(b), Some(g)) => Some(w * b + (1.0 - w) * g),
            (Some(b), None) => Some(b),
            (None, Some(g)) => Some(g),
            (None, None) => None,
        }
    }
}

// ── Per-source tracks ─────────────────────────────────────────────────────────

/// Rate of change between consecutive samples, per second.
#[derive(Default)]
struct Derivative {
    last: Option<(Millis, f32)>,
}

impl Derivative {
    fn update(&mut self, now: Millis, value: f32) -> Option<f32> {
        let rate = self.last.and_then(|(t, prev)| {
            let dt_ms = elapsed(now, t);
            (dt_ms > 0).then(|| (value - prev) * 1000.0 / dt_ms as f32)
        });
        self.last = Some((now, value));
        rate
    }
}

/// Altitude, vertical speed and vertical acceleration from one source.
#[derive(Default)]
struct SourceTrack {
    altitude: RunningAverage<f32, SENSOR_WINDOW>,
    speed: RunningAverage<f32, SENSOR_WINDOW>,
    acceleration: RunningAverage<f32, SENSOR_WINDOW>,
    climb: Derivative,
    jerk: Derivative,
    last_sample_at: Option<Millis>,
}

impl SourceTrack {
    fn push_altitude(&mut self, now: Millis, altitude_m: f32) {
        self.altitude.add_value(altitude_m);
        if let Some(speed) = self.climb.update(now, altitude_m) {
            self.speed.add_value(speed);
            if let Some(accel) = self.jerk.update(now, speed) {
                self.acceleration.add_value(accel);
            }
        }
        self.last_sample_at = Some(now);
    }

    fn is_fresh(&self, now: Millis, stale_after: Millis) -> bool {
        self.last_sample_at
            .is_some_and(|t| elapsed(now, t) < stale_after)
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorStats {
    pub battery_failures: u32,
    /// Read errors plus readings already stale when taken.
    pub barometer_failures: u32,
    /// GPS gate fired with the altitude invalid or stale.
    pub gps_skipped: u32,
    /// Fusion gate fired with no fresh source at all.
    pub fusion_skipped: u32,
}

// ── Data manager ──────────────────────────────────────────────────────────────

/// Owns every smoothed quantity and the gates that pace their sampling.
///
/// Each `update_*` task returns `true` when its gate fired this call. A
/// failed sensor read still consumes the gate slot but never pushes a value,
/// so the averages only ever contain real readings.
pub struct DataManager {
    config: DataConfig,

    battery_gate: TimerGate,
    barometer_gate: TimerGate,
    gps_gate: TimerGate,
    fusion_gate: TimerGate,

    battery: RunningAverage<u16, BATTERY_WINDOW>,
    temperature: RunningAverage<f32, SENSOR_WINDOW>,
    baro: SourceTrack,
    gps: SourceTrack,
    last_gps_fix_at: Option<Millis>,

    // Fused
    altitude: RunningAverage<f32, SENSOR_WINDOW>,
    speed: RunningAverage<f32, SENSOR_WINDOW>,
    acceleration: RunningAverage<f32, SENSOR_WINDOW>,

    stats: SensorStats,
}

impl DataManager {
    pub fn new(config: DataConfig) -> Self {
        Self {
            battery_gate: TimerGate::new(config.battery_interval_ms),
            barometer_gate: TimerGate::new(config.barometer_interval_ms),
            gps_gate: TimerGate::new(config.gps_interval_ms),
            fusion_gate: TimerGate::new(config.fusion_interval_ms),
            config,
            battery: RunningAverage::new(),
            temperature: RunningAverage::new(),
            baro: SourceTrack::default(),
            gps: SourceTrack::default(),
            last_gps_fix_at: None,
            altitude: RunningAverage::new(),
            speed: RunningAverage::new(),
            acceleration: RunningAverage::new(),
            stats: SensorStats::default(),
        }
    }

    pub fn stats(&self) -> SensorStats {
        self.stats
    }

    /// Starts the barometer driver. Failure is not fatal: later reads fail
    /// and are skipped until the driver comes up.
    pub fn setup_barometer<B: Barometer>(&mut self, baro: &mut B) {
        match baro.begin() {
            Ok(()) => info!("barometer ready"),
            Err(e) => warn!("barometer init failed: {}", e),
        }
    }

    pub fn update_battery<V: BatterySense>(&mut self, now: Millis, battery: &mut V) -> bool {
        if !self.battery_gate.poll(now) {
            return false;
        }
        match battery.read_raw() {
            Ok(raw) => self.battery.add_value(self.config.centivolts(raw)),
            Err(e) => {
                self.stats.battery_failures = self.stats.battery_failures.wrapping_add(1);
                debug!("battery read skipped: {}", e);
            }
        }
        true
    }

    pub fn update_barometer<B: Barometer>(&mut self, now: Millis, baro: &mut B) -> bool {
        if !self.barometer_gate.poll(now) {
            return false;
        }
        match baro.read() {
            Ok(reading) if elapsed(now, reading.measured_at) >= self.config.stale_after_ms => {
                self.stats.barometer_failures = self.stats.barometer_failures.wrapping_add(1);
                debug!("barometer reading stale, measured at {}", reading.measured_at);
            }
            // Same conversion handed back twice
            Ok(reading) if self.baro.last_sample_at == Some(reading.measured_at) => {}
            Ok(reading) => {
                // Derivatives and staleness follow the conversion time
                self.baro.push_altitude(reading.measured_at, reading.altitude_m);
                self.temperature
                    .add_value(celsius_to_fahrenheit(reading.temperature_c));
            }
            Err(e) => {
                self.stats.barometer_failures = self.stats.barometer_failures.wrapping_add(1);
                debug!("barometer read skipped: {}", e);
            }
        }
        true
    }

    /// Samples the GPS altitude, once per decoder commit.
    pub fn update_gps_altitude<G: GpsReadings>(&mut self, now: Millis, gps: &G) -> bool {
        if !self.gps_gate.poll(now) {
            return false;
        }
        let field = gps.altitude_m();
        match field.fresh(now, self.config.stale_after_ms) {
            // No new commit since the last sample; normal between fixes
            Some(_) if self.last_gps_fix_at == Some(field.updated_at) => {}
            Some(altitude_m) => {
                // Fix time, not sampling time: derivatives and staleness
                // follow the receiver's own cadence
                self.gps.push_altitude(field.updated_at, altitude_m);
                self.last_gps_fix_at = Some(field.updated_at);
            }
            None => self.stats.gps_skipped = self.stats.gps_skipped.wrapping_add(1),
        }
        true
    }

    /// Folds the barometer and GPS tracks into the unified averages.
    pub fn calculate_location(&mut self, now: Millis) -> bool {
        if !self.fusion_gate.poll(now) {
            return false;
        }
        let stale_after = self.config.stale_after_ms;
        let baro = self.baro.is_fresh(now, stale_after).then_some(&self.baro);
        let gps = self.gps.is_fresh(now, stale_after).then_some(&self.gps);

        let altitude = self.config.fuse(
            baro.and_then(|t| t.altitude.average()),
            gps.and_then(|t| t.altitude.average()),
        );
        let speed = self.config.fuse(
            baro.and_then(|t| t.speed.average()),
            gps.and_then(|t| t.speed.average()),
        );
        let acceleration = self.config.fuse(
            baro.and_then(|t| t.acceleration.average()),
            gps.and_then(|t| t.acceleration.average()),
        );

        if altitude.is_none() {
            self.stats.fusion_skipped = self.stats.fusion_skipped.wrapping_add(1);
        }
        if let Some(v) = altitude {
            self.altitude.add_value(v);
        }
        if let Some(v) = speed {
            self.speed.add_value(v);
        }
        if let Some(v) = acceleration {
            self.acceleration.add_value(v);
        }
        true
    }

    /// Battery voltage in centivolts.
    pub fn average_battery(&self) -> Option<u16> {
        self.battery.average()
    }

    /// Fused altitude, metres.
    pub fn average_altitude(&self) -> Option<f32> {
        self.altitude.average()
    }

    /// Fused vertical speed, m/s.
    pub fn average_speed(&self) -> Option<f32> {
        self.speed.average()
    }

    /// Fused vertical acceleration, m/s².
    pub fn average_acceleration(&self) -> Option<f32> {
        self.acceleration.average()
    }

    /// Barometer temperature, °F.
    pub fn average_temperature(&self) -> Option<f32> {
        self.temperature.average()
    }

    pub fn average_baro_altitude(&self) -> Option<f32> {
        self.baro.altitude.average()
    }

    pub fn average_gps_altitude(&self) -> Option<f32> {
        self.gps.altitude.average()
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self::new(DataConfig::default())
    }
}
