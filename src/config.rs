//! Configuration types for the HMC5883L / HMC5983
//!
//! Every register field the driver writes is modelled as a closed enum, so the
//! typed setters cannot produce reserved bit patterns. Raw register values
//! coming from elsewhere (a settings store, a command parser) go through
//! `TryFrom<u8>`, which rejects anything outside the field's range.
//!
//! # Example
//!
//! ```ignore
//! # use hmc5883::{Hmc5883lDriver, MagConfig, DataOutputRate, SamplesAveraged, OperatingMode};
//! # let mut compass: Hmc5883lDriver<_> = todo!();
//! let config = MagConfig {
//!     samples_averaged: SamplesAveraged::Eight,
//!     data_output_rate: DataOutputRate::Hz75,
//!     operating_mode: OperatingMode::Continuous,
//!     ..MagConfig::default()
//! };
//! compass.configure(&config)?;
//! # Ok::<(), hmc5883::Error<()>>(())
//! ```

use crate::registers::{CRA_DO_MASK, CRA_MA_MASK, CRA_MS_MASK, CRB_GN_MASK, MR_MD_MASK};

/// Error returned when a raw value does not map onto a field's range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue(pub u8);

/// Operating mode (MR bits 0-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Measure continuously at the configured output rate
    Continuous = 0x00,
    /// Take one measurement, then fall back to idle (power-on default)
    Single = 0x01,
    /// Idle, most of the device powered down
    Idle = 0x02,
}

impl OperatingMode {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the two mode-select bits; the chip treats both 2 and 3 as idle
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Self::Continuous,
            0x01 => Self::Single,
            _ => Self::Idle,
        }
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Continuous),
            0x01 => Ok(Self::Single),
            0x02 => Ok(Self::Idle),
            _ => Err(InvalidValue(value)),
        }
    }
}

/// Number of samples averaged per measurement output (CRA bits 5-6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplesAveraged {
    /// 1 sample (power-on default)
    One = 0x00,
    /// 2 samples
    Two = 0x01,
    /// 4 samples
    Four = 0x02,
    /// 8 samples
    Eight = 0x03,
}

impl SamplesAveraged {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Number of samples averaged
    #[must_use]
    pub const fn count(self) -> u8 {
        1 << (self as u8)
    }
}

impl TryFrom<u8> for SamplesAveraged {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::One),
            0x01 => Ok(Self::Two),
            0x02 => Ok(Self::Four),
            0x03 => Ok(Self::Eight),
            _ => Err(InvalidValue(value)),
        }
    }
}

/// Data output rate in continuous measurement mode (CRA bits 2-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataOutputRate {
    /// 0.75 Hz
    Hz0_75 = 0x00,
    /// 1.5 Hz
    Hz1_5 = 0x01,
    /// 3 Hz
    Hz3 = 0x02,
    /// 7.5 Hz
    Hz7_5 = 0x03,
    /// 15 Hz (power-on default)
    Hz15 = 0x04,
    /// 30 Hz
    Hz30 = 0x05,
    /// 75 Hz
    Hz75 = 0x06,
}

impl DataOutputRate {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Output rate in Hz
    #[must_use]
    pub const fn hz(self) -> f32 {
        match self {
            Self::Hz0_75 => 0.75,
            Self::Hz1_5 => 1.5,
            Self::Hz3 => 3.0,
            Self::Hz7_5 => 7.5,
            Self::Hz15 => 15.0,
            Self::Hz30 => 30.0,
            Self::Hz75 => 75.0,
        }
    }
}

impl TryFrom<u8> for DataOutputRate {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Hz0_75),
            0x01 => Ok(Self::Hz1_5),
            0x02 => Ok(Self::Hz3),
            0x03 => Ok(Self::Hz7_5),
            0x04 => Ok(Self::Hz15),
            0x05 => Ok(Self::Hz30),
            0x06 => Ok(Self::Hz75),
            _ => Err(InvalidValue(value)),
        }
    }
}

/// Measurement bias mode (CRA bits 0-1)
///
/// The bias modes drive a current through the sensor straps and are used for
/// self test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementMode {
    /// Normal measurement (power-on default)
    Normal = 0x00,
    /// Positive bias on all three axes
    PositiveBias = 0x01,
    /// Negative bias on all three axes
    NegativeBias = 0x02,
}

impl MeasurementMode {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MeasurementMode {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Normal),
            0x01 => Ok(Self::PositiveBias),
            0x02 => Ok(Self::NegativeBias),
            _ => Err(InvalidValue(value)),
        }
    }
}

/// Gain / full-scale range (CRB bits 5-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// +/-0.88 Ga, 1370 LSB/Ga
    Ga0_88 = 0x00,
    /// +/-1.3 Ga, 1090 LSB/Ga (power-on default)
    Ga1_3 = 0x01,
    /// +/-1.9 Ga, 820 LSB/Ga
    Ga1_9 = 0x02,
    /// +/-2.5 Ga, 660 LSB/Ga
    Ga2_5 = 0x03,
    /// +/-4.0 Ga, 440 LSB/Ga
    Ga4_0 = 0x04,
    /// +/-4.7 Ga, 390 LSB/Ga
    Ga4_7 = 0x05,
    /// +/-5.6 Ga, 330 LSB/Ga
    Ga5_6 = 0x06,
    /// +/-8.1 Ga, 230 LSB/Ga
    Ga8_1 = 0x07,
}

impl Gain {
    /// Register encoding
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the three gain bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Self::Ga0_88,
            0x01 => Self::Ga1_3,
            0x02 => Self::Ga1_9,
            0x03 => Self::Ga2_5,
            0x04 => Self::Ga4_0,
            0x05 => Self::Ga4_7,
            0x06 => Self::Ga5_6,
            _ => Self::Ga8_1,
        }
    }

    /// Digital resolution in LSB per gauss
    #[must_use]
    pub const fn lsb_per_gauss(self) -> u16 {
        match self {
            Self::Ga0_88 => 1370,
            Self::Ga1_3 => 1090,
            Self::Ga1_9 => 820,
            Self::Ga2_5 => 660,
            Self::Ga4_0 => 440,
            Self::Ga4_7 => 390,
            Self::Ga5_6 => 330,
            Self::Ga8_1 => 230,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0x07 {
            return Err(InvalidValue(value));
        }
        Ok(Self::from_bits(value))
    }
}

/// I2C bus speed (HMC5983 MR bit 7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedMode {
    /// Standard/fast mode I2C, up to 400 kHz
    #[default]
    Normal = 0x00,
    /// High speed I2C, 3400 kHz
    HighSpeed = 0x01,
}

impl TryFrom<u8> for SpeedMode {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Normal),
            0x01 => Ok(Self::HighSpeed),
            _ => Err(InvalidValue(value)),
        }
    }
}

/// SPI wiring (HMC5983 MR bit 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialInterfaceMode {
    /// 4-wire SPI (separate SDI and SDO)
    #[default]
    FourWire = 0x00,
    /// 3-wire SPI (shared SDI/SDO)
    ThreeWire = 0x01,
}

impl TryFrom<u8> for SerialInterfaceMode {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::FourWire),
            0x01 => Ok(Self::ThreeWire),
            _ => Err(InvalidValue(value)),
        }
    }
}

/// Full measurement configuration shared by both chips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagConfig {
    /// Samples averaged per output
    pub samples_averaged: SamplesAveraged,
    /// Output rate in continuous mode
    pub data_output_rate: DataOutputRate,
    /// Bias mode
    pub measurement_mode: MeasurementMode,
    /// Full-scale range
    pub gain: Gain,
    /// Operating mode, applied last
    pub operating_mode: OperatingMode,
}

impl Default for MagConfig {
    /// The chip's power-on configuration
    fn default() -> Self {
        Self {
            samples_averaged: SamplesAveraged::One,
            data_output_rate: DataOutputRate::Hz15,
            measurement_mode: MeasurementMode::Normal,
            gain: Gain::Ga1_3,
            operating_mode: OperatingMode::Single,
        }
    }
}

impl MagConfig {
    /// Decode the configuration held in CRA, CRB and MR
    ///
    /// # Errors
    ///
    /// Returns the offending field value if a register holds a reserved bit
    /// pattern (output rate 7 or bias mode 3).
    pub fn from_registers(config_a: u8, config_b: u8, mode: u8) -> Result<Self, InvalidValue> {
        Ok(Self {
            samples_averaged: SamplesAveraged::try_from((config_a & CRA_MA_MASK) >> 5)?,
            data_output_rate: DataOutputRate::try_from((config_a & CRA_DO_MASK) >> 2)?,
            measurement_mode: MeasurementMode::try_from(config_a & CRA_MS_MASK)?,
            gain: Gain::try_from((config_b & CRB_GN_MASK) >> 5)?,
            operating_mode: OperatingMode::from_bits(mode & MR_MD_MASK),
        })
    }
}

/// HMC5983 configuration: the shared settings plus the extended fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hmc5983Config {
    /// Settings common with the HMC5883L
    pub base: MagConfig,
    /// Enable the temperature sensor (needed for temperature compensation)
    pub temperature_sensor: bool,
    /// I2C speed
    pub speed_mode: SpeedMode,
    /// Lowest power mode
    pub lowest_power: bool,
    /// SPI wiring
    pub serial_interface: SerialInterfaceMode,
}
