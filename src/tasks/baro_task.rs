use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_executor::task;
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals::{DMA1_CH0, DMA1_CH7, I2C1};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};

use rocketduino::sensors::{pressure_altitude_m, BaroReading, SEA_LEVEL_PA};

use crate::drivers::mpl3115a2::Mpl3115a2;

/// Set once the sensor has been configured.
pub static BARO_READY: AtomicBool = AtomicBool::new(false);

/// Barometer task: polls the MPL3115A2 at 10 Hz and publishes each conversion,
/// stamped with its read time, to the main loop. Retries init every second
/// until the part answers.
#[task]
pub async fn baro_task(
    mut i2c: I2c<'static, I2C1, DMA1_CH7, DMA1_CH0>,
    baro_out: &'static Signal<CriticalSectionRawMutex, BaroReading>,
) {
    let mut baro = Mpl3115a2::new();
    while let Err(e) = baro.init(&mut i2c).await {
        warn!("mpl3115a2 init failed: {}", e);
        Timer::after(Duration::from_secs(1)).await;
    }
    BARO_READY.store(true, Ordering::Release);
    info!("mpl3115a2 up");

    let mut ticker = Ticker::every(Duration::from_hz(10));
    loop {
        ticker.next().await;

        if let Ok((pressure_pa, temperature_c)) = baro.read(&mut i2c) {
            let reading = BaroReading {
                altitude_m: pressure_altitude_m(pressure_pa, SEA_LEVEL_PA),
                temperature_c,
                measured_at: Instant::now().as_millis() as u32,
            };
            // Replaces any conversion the loop has not taken yet
            baro_out.signal(reading);
        }
    }
}
