#![no_std]
#![no_main]

mod adapters;
mod board;
mod drivers;
mod tasks;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_stm32::adc::{Adc, Resolution};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::Uart;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Instant, Ticker, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rocketduino::protocol::Line;
use rocketduino::sensors::BaroReading;
use rocketduino::{FlightLoop, Io, TimerGate};

use crate::adapters::{AdcBattery, ChannelBytes, DownlinkSink, LatestBaro};
use crate::board::{uart_config, Board, GPS_BAUD, I2C_HZ, LOOP_HZ, RADIO_BAUD};
use crate::tasks::downlink_task::DOWNLINK_QUEUE;
use crate::tasks::serial_rx::{GPS_RX_QUEUE, UPLINK_QUEUE};

// ── Inter-task channels ───────────────────────────────────────────────────────
//  Barometer is a Signal: a new conversion replaces an unread one.
static BARO_SIGNAL:   Signal<CriticalSectionRawMutex, BaroReading>                  = Signal::new();
static GPS_RX_CHAN:   Channel<CriticalSectionRawMutex, u8,          GPS_RX_QUEUE>   = Channel::new();
static UPLINK_CHAN:   Channel<CriticalSectionRawMutex, u8,          UPLINK_QUEUE>   = Channel::new();
static DOWNLINK_CHAN: Channel<CriticalSectionRawMutex, Line,        DOWNLINK_QUEUE> = Channel::new();

static FLIGHT: StaticCell<FlightLoop> = StaticCell::new();

/// Diagnostic counters go to RTT this often.
const REPORT_INTERVAL_MS: u32 = 10_000;

// ── Interrupt bindings ────────────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1_EV  => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER  => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    UART4    => embassy_stm32::usart::InterruptHandler<peripherals::UART4>;
    USART3   => embassy_stm32::usart::InterruptHandler<peripherals::USART3>;
});

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;

    // 2. I2C1, MPL3115A2 barometer (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        TimeHertz(I2C_HZ),
        Default::default(),
    );

    // 3. GPS USART3 (TX=PB10, RX=PB11); receive only
    let gps_uart = unwrap!(Uart::new(
        p.USART3, p.PB11, p.PB10,
        Irqs,
        p.DMA1_CH3, p.DMA1_CH1,
        uart_config(GPS_BAUD),
    ));
    let (_gps_tx, gps_rx) = gps_uart.split();

    // 4. Radio modem UART4 (TX=PA0, RX=PA1)
    //    Rx → uplink commands, Tx ← telemetry/status lines
    let radio_uart = unwrap!(Uart::new(
        p.UART4, p.PA1, p.PA0,
        Irqs,
        p.DMA1_CH4, p.DMA1_CH2,
        uart_config(RADIO_BAUD),
    ));
    let (radio_tx, radio_rx) = radio_uart.split();

    // 5. Battery sense divider on PC2, 10-bit conversions
    let mut adc = Adc::new(p.ADC1, &mut Delay);
    adc.set_resolution(Resolution::TenBit);
    let mut battery = AdcBattery::new(adc, p.PC2);

    // 6. Link status LED (PC13, active low)
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);

    // 7. Spawn I/O tasks
    unwrap!(spawner.spawn(tasks::baro_task::baro_task(i2c, &BARO_SIGNAL)));
    unwrap!(spawner.spawn(tasks::serial_rx::gps_rx_task(gps_rx, GPS_RX_CHAN.sender())));
    unwrap!(spawner.spawn(tasks::serial_rx::uplink_rx_task(radio_rx, UPLINK_CHAN.sender())));
    unwrap!(spawner.spawn(tasks::downlink_task::downlink_task(radio_tx, DOWNLINK_CHAN.receiver())));

    let mut barometer = LatestBaro::new(&BARO_SIGNAL);
    let mut gps_bytes = ChannelBytes::new(GPS_RX_CHAN.receiver());
    let mut uplink = ChannelBytes::new(UPLINK_CHAN.receiver());
    let mut downlink = DownlinkSink::new(DOWNLINK_CHAN.sender());

    // 8. Let the barometer come up before the loop asks for it
    Timer::after(Duration::from_millis(200)).await;
    let flight = FLIGHT.init(FlightLoop::default());
    flight.setup(&mut barometer);

    // 9. Main loop
    let mut report = TimerGate::new(REPORT_INTERVAL_MS);
    let mut ticker = Ticker::every(Duration::from_hz(LOOP_HZ));
    loop {
        ticker.next().await;
        let now = Instant::now().as_millis() as u32;

        flight.tick(
            now,
            Io {
                barometer: &mut barometer,
                battery: &mut battery,
                gps_rx: &mut gps_bytes,
                uplink: &mut uplink,
                downlink: &mut downlink,
            },
        );

        let lit = flight.link_health(now).indicator(now);
        led.set_level(Level::from(!lit));

        if report.poll(now) {
            info!(
                "link {} sensors {} nmea frame_errors={} unknown={}",
                flight.comms.stats(),
                flight.data.stats(),
                flight.gps.frame_errors(),
                flight.gps.unknown_sentences(),
            );
        }
    }
}
