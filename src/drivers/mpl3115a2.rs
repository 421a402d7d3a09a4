use embassy_stm32::i2c::{Error, I2c, Instance, RxDma, TxDma};
use embassy_time::{Duration, Timer};

const ADDR: u8 = 0x60;
const REG_STATUS: u8 = 0x00;
const REG_OUT_P_MSB: u8 = 0x01;
const REG_WHO_AM_I: u8 = 0x0C;
const REG_PT_DATA_CFG: u8 = 0x13;
const REG_CTRL_REG1: u8 = 0x26;

const CHIP_ID: u8 = 0xC4;

const CTRL1_RST: u8 = 0x04;
const CTRL1_SBYB: u8 = 0x01;
/// Oversample x16, ~66 ms per conversion.
const CTRL1_OS16: u8 = 0b100 << 3;
/// Pressure + temperature data-ready flags.
const PT_DATA_CFG_ALL: u8 = 0x07;
const STATUS_PTDR: u8 = 0x08;

#[derive(Debug, Clone, Copy)]
pub enum Mpl3115Error {
    Bus(Error),
    WrongChip(u8),
    NotReady,
}

impl defmt::Format for Mpl3115Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Mpl3115Error::Bus(_) => defmt::write!(f, "i2c bus error"),
            Mpl3115Error::WrongChip(id) => defmt::write!(f, "unexpected chip id {=u8:#x}", id),
            Mpl3115Error::NotReady => defmt::write!(f, "no conversion ready"),
        }
    }
}

impl From<Error> for Mpl3115Error {
    fn from(e: Error) -> Self {
        Mpl3115Error::Bus(e)
    }
}

/// MPL3115A2 in barometer mode, converting continuously.
pub struct Mpl3115a2 {
    ready: bool,
}

impl Mpl3115a2 {
    pub fn new() -> Self {
        Self { ready: false }
    }

    pub async fn init<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        &mut self,
        i2c: &mut I2c<'_, T, Tx, Rx>,
    ) -> Result<(), Mpl3115Error> {
        let id = self.read_reg(i2c, REG_WHO_AM_I)?;
        if id != CHIP_ID {
            return Err(Mpl3115Error::WrongChip(id));
        }

        // The part NAKs the reset write itself
        let _ = self.write_reg(i2c, REG_CTRL_REG1, CTRL1_RST);
        Timer::after(Duration::from_millis(10)).await;

        self.write_reg(i2c, REG_CTRL_REG1, CTRL1_OS16)?;
        self.write_reg(i2c, REG_PT_DATA_CFG, PT_DATA_CFG_ALL)?;
        self.write_reg(i2c, REG_CTRL_REG1, CTRL1_OS16 | CTRL1_SBYB)?;

        self.ready = true;
        Ok(())
    }

    /// Latest conversion as (pressure Pa, temperature °C).
    pub fn read<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        &mut self,
        i2c: &mut I2c<'_, T, Tx, Rx>,
    ) -> Result<(f32, f32), Mpl3115Error> {
        if !self.ready {
            return Err(Mpl3115Error::NotReady);
        }
        if self.read_reg(i2c, REG_STATUS)? & STATUS_PTDR == 0 {
            return Err(Mpl3115Error::NotReady);
        }

        // OUT_P (3 bytes) then OUT_T (2 bytes), auto-increment
        let mut buf = [0u8; 5];
        i2c.blocking_write_read(ADDR, &[REG_OUT_P_MSB], &mut buf)?;

        Ok((pressure_pa(&buf[..3]), temperature_c(&buf[3..])))
    }

    fn read_reg<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        &mut self,
        i2c: &mut I2c<'_, T, Tx, Rx>,
        reg: u8,
    ) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        i2c.blocking_write_read(ADDR, &[reg], &mut buf)?;
        Ok(buf[0])
    }

    fn write_reg<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        &mut self,
        i2c: &mut I2c<'_, T, Tx, Rx>,
        reg: u8,
        val: u8,
    ) -> Result<(), Error> {
        i2c.blocking_write(ADDR, &[reg, val])
    }
}

/// Unsigned Q18.2 Pascals, left-justified in 20 bits.
fn pressure_pa(b: &[u8]) -> f32 {
    let raw = ((b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32) >> 4;
    raw as f32 / 4.0
}

/// Signed Q8.4 °C, left-justified in 12 bits.
fn temperature_c(b: &[u8]) -> f32 {
    let raw = i16::from_be_bytes([b[0], b[1]]);
    raw as f32 / 256.0
}
