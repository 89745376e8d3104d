#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod device;
pub mod extended;
pub mod heading;
pub mod interface;
pub mod registers;

// Re-export main types
pub use config::{
    DataOutputRate, Gain, Hmc5983Config, InvalidValue, MagConfig, MeasurementMode,
    OperatingMode, SamplesAveraged, SerialInterfaceMode, SpeedMode,
};
pub use device::{Hmc5883lDriver, MagData, MagDataGauss, Status};
pub use extended::{Hmc5983Driver, Hmc5983Status};
pub use heading::{compute_vector_angle, radians_to_degrees};
pub use interface::{I2cInterface, RegisterAccess, SpiInterface};

#[cfg(feature = "async")]
pub use interface::AsyncRegisterAccess;

/// HMC5883L / HMC5983 7-bit I2C address (fixed, 0x1E)
pub const DEVICE_ADDRESS: u8 = 0x1E;

/// Expected contents of identification registers A, B and C (`"H43"`)
pub const IDENTIFICATION: [u8; 3] = *b"H43";

/// Driver errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Identification registers did not read `H43` (contains the bytes read)
    InvalidDevice([u8; 3]),
    /// A register holds a value outside the field's defined range
    InvalidConfig,
    /// No new sample became ready while polling the status register
    Timeout,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
