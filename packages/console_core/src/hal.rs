//! Hardware seams the console core drives. The firmware implements these
//! over esp-hal peripherals; tests implement them over plain structs.

use crate::calibration::CALIBRATION_RECORD_LEN;
use crate::net::NetEvent;

/// One burst read of the IMU data registers (temperature skipped).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawImuSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

impl RawImuSample {
    /// Decodes the 14-byte big-endian block starting at ACCEL_XOUT_H.
    pub fn from_register_block(block: &[u8; 14]) -> Self {
        let word = |idx: usize| i16::from_be_bytes([block[idx], block[idx + 1]]);
        Self {
            accel: [word(0), word(2), word(4)],
            gyro: [word(8), word(10), word(12)],
        }
    }
}

pub trait ImuSource {
    type Error;

    fn read_raw(&mut self) -> Result<RawImuSample, Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoystickAxis {
    X,
    Y,
}

pub trait JoystickSource {
    fn read_axis(&mut self, axis: JoystickAxis) -> u16;
    fn button_pressed(&mut self) -> bool;
}

pub trait ToneOutput {
    fn set_level(&mut self, high: bool);
}

pub trait MonotonicClock {
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }
}

pub trait DelayOps {
    fn delay_us(&self, micros: u32);
    fn delay_ms(&self, millis: u32);
}

pub trait CalibrationStorage {
    type Error;

    fn load(&mut self) -> Result<[u8; CALIBRATION_RECORD_LEN], Self::Error>;
    fn store(&mut self, record: &[u8; CALIBRATION_RECORD_LEN]) -> Result<(), Self::Error>;
}

/// Non-blocking source of events produced outside the frame loop.
pub trait NetInbox {
    fn poll(&mut self) -> Option<NetEvent>;
}

/// Everything the frame loop touches synchronously.
pub trait ConsoleHardware:
    ImuSource + JoystickSource + ToneOutput + MonotonicClock + DelayOps
{
}

impl<T> ConsoleHardware for T where
    T: ImuSource + JoystickSource + ToneOutput + MonotonicClock + DelayOps
{
}
