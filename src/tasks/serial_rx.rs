use embassy_executor::task;
use embassy_futures::select::{select, Either};
use embassy_stm32::peripherals::{DMA1_CH1, DMA1_CH2, UART4, USART3};
use embassy_stm32::usart::UartRx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};

/// Bytes buffered between the GPS UART and the main loop. At 9600 baud the
/// receiver produces under 1 kB/s and the loop drains every 10 ms.
pub const GPS_RX_QUEUE: usize = 256;
pub const UPLINK_QUEUE: usize = 32;

/// GPS receive task: forwards raw NMEA bytes to the loop's decoder.
#[task]
pub async fn gps_rx_task(
    mut gps_rx: UartRx<'static, USART3, DMA1_CH1>,
    bytes_tx: Sender<'static, CriticalSectionRawMutex, u8, GPS_RX_QUEUE>,
) {
    let mut buf = [0u8; 128];
    let mut dropped: u32 = 0;

    loop {
        // One burst per fix; the idle line closes it
        match select(
            gps_rx.read_until_idle(&mut buf),
            Timer::after(Duration::from_millis(1100)),
        )
        .await
        {
            Either::First(Ok(n)) => {
                for &b in &buf[..n] {
                    if bytes_tx.try_send(b).is_err() {
                        dropped = dropped.wrapping_add(1);
                    }
                }
                if dropped > 0 {
                    defmt::warn!("gps rx: {} bytes dropped", dropped);
                    dropped = 0;
                }
            }
            Either::First(Err(_)) | Either::Second(_) => {
                // UART error or silent receiver, keep listening
            }
        }
    }
}

/// Ground-station receive task: every byte is a command.
#[task]
pub async fn uplink_rx_task(
    mut radio_rx: UartRx<'static, UART4, DMA1_CH2>,
    bytes_tx: Sender<'static, CriticalSectionRawMutex, u8, UPLINK_QUEUE>,
) {
    let mut buf = [0u8; 16];
    loop {
        if let Ok(n) = radio_rx.read_until_idle(&mut buf).await {
            for &b in &buf[..n] {
                let _ = bytes_tx.try_send(b);
            }
        }
    }
}
