use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::Config as UsartConfig;
use embassy_stm32::Config;

// ── Link settings ─────────────────────────────────────────────────────────────
/// NMEA receiver, USART3 (TX=PB10, RX=PB11).
pub const GPS_BAUD: u32 = 9_600;
/// Ground radio modem, UART4 (TX=PA0, RX=PA1).
pub const RADIO_BAUD: u32 = 9_600;
/// I2C1 (SCL=PB8, SDA=PB9), barometer only.
pub const I2C_HZ: u32 = 400_000;

/// Main loop rate. Every gate in the library is far slower than this.
pub const LOOP_HZ: u64 = 100;

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2), // 168 MHz
            divq: None,
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        Self { p }
    }
}

/// 8N1 at `baudrate`.
pub fn uart_config(baudrate: u32) -> UsartConfig {
    let mut config = UsartConfig::default();
    config.baudrate = baudrate;
    config
}
