//! Glue between the embassy side (channels, ADC) and the library's
//! non-blocking collaborator traits.

use core::sync::atomic::Ordering;

use embassy_stm32::adc::Adc;
use embassy_stm32::peripherals::{ADC1, PC2};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_sync::signal::Signal;

use rocketduino::protocol::Line;
use rocketduino::sensors::{BaroReading, Barometer, BatterySense, SensorError};
use rocketduino::transport::{ByteSource, LineSink, LinkError};

use crate::tasks::baro_task::BARO_READY;

/// Barometer backed by the baro task's latest conversion.
pub struct LatestBaro {
    latest: &'static Signal<CriticalSectionRawMutex, BaroReading>,
}

impl LatestBaro {
    pub fn new(latest: &'static Signal<CriticalSectionRawMutex, BaroReading>) -> Self {
        Self { latest }
    }
}

impl Barometer for LatestBaro {
    fn begin(&mut self) -> Result<(), SensorError> {
        if BARO_READY.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SensorError::Unavailable)
        }
    }

    fn read(&mut self) -> Result<BaroReading, SensorError> {
        // Empty until the task publishes again
        self.latest.try_take().ok_or(SensorError::Unavailable)
    }
}

/// Receive side of a UART task.
pub struct ChannelBytes<const N: usize> {
    rx: Receiver<'static, CriticalSectionRawMutex, u8, N>,
}

impl<const N: usize> ChannelBytes<N> {
    pub fn new(rx: Receiver<'static, CriticalSectionRawMutex, u8, N>) -> Self {
        Self { rx }
    }
}

impl<const N: usize> ByteSource for ChannelBytes<N> {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.try_receive().ok()
    }
}

/// Transmit side of the downlink task.
pub struct DownlinkSink<const N: usize> {
    tx: Sender<'static, CriticalSectionRawMutex, Line, N>,
}

impl<const N: usize> DownlinkSink<N> {
    pub fn new(tx: Sender<'static, CriticalSectionRawMutex, Line, N>) -> Self {
        Self { tx }
    }
}

impl<const N: usize> LineSink for DownlinkSink<N> {
    fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        let mut owned = Line::new();
        owned.push_str(line).map_err(|_| LinkError::TooLong)?;
        self.tx.try_send(owned).map_err(|_| LinkError::Busy)
    }
}

/// Battery divider on PC2, sampled at 10 bits.
pub struct AdcBattery {
    adc: Adc<'static, ADC1>,
    pin: PC2,
}

impl AdcBattery {
    pub fn new(adc: Adc<'static, ADC1>, pin: PC2) -> Self {
        Self { adc, pin }
    }
}

impl BatterySense for AdcBattery {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.adc.read(&mut self.pin))
    }
}
