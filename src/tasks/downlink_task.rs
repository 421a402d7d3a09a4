use embassy_executor::task;
use embassy_stm32::peripherals::{DMA1_CH4, UART4};
use embassy_stm32::usart::UartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;

use rocketduino::protocol::Line;

/// Lines the loop may queue before `send_line` reports busy.
pub const DOWNLINK_QUEUE: usize = 4;

/// Radio transmit task: writes each queued line out UART4 in order.
#[task]
pub async fn downlink_task(
    mut radio_tx: UartTx<'static, UART4, DMA1_CH4>,
    lines_rx: Receiver<'static, CriticalSectionRawMutex, Line, DOWNLINK_QUEUE>,
) {
    loop {
        let line = lines_rx.receive().await;
        if radio_tx.write(line.as_bytes()).await.is_err() {
            defmt::warn!("downlink: uart write failed");
        }
    }
}
