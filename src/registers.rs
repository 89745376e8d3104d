//! Register definitions for the HMC5883L and HMC5983
//!
//! Both chips share one register map. The HMC5983 reinterprets bits that are
//! reserved on the HMC5883L (CRA bit 7, MR bits 2, 5 and 7, SR bit 4) and adds
//! the temperature output registers at 0x31/0x32.
//!
//! ## Register Map
//! - **0x00** Configuration A: bias mode, output rate, averaging
//! - **0x01** Configuration B: gain
//! - **0x02** Mode: operating mode
//! - **0x03..=0x08** Data output X, Z, Y (MSB first)
//! - **0x09** Status
//! - **0x0A..=0x0C** Identification (`'H'`, `'4'`, `'3'`)
//! - **0x31..=0x32** Temperature (HMC5983 only)
//!
//! The data output, identification and temperature registers are read as
//! blocks through [`RegisterAccess`](crate::interface::RegisterAccess), so only
//! the bit-field registers are described here.

/// Configuration Register A address
pub const CONFIG_A: u8 = 0x00;
/// Configuration Register B address
pub const CONFIG_B: u8 = 0x01;
/// Mode Register address
pub const MODE: u8 = 0x02;
/// Data Output X MSB register (first byte of the sample block)
pub const DATA_OUT_X_MSB: u8 = 0x03;
/// Status Register address
pub const STATUS: u8 = 0x09;
/// Identification Register A (first byte of the identification block)
pub const IDENTIFICATION_A: u8 = 0x0A;
/// Temperature Output MSB register (HMC5983 only)
pub const TEMPERATURE_MSB: u8 = 0x31;

/// Number of bytes in one X/Z/Y sample block
pub const SAMPLE_LEN: usize = 6;

/// CRA measurement (bias) mode mask, bits 0-1
pub const CRA_MS_MASK: u8 = 0x03;
/// CRA data output rate mask, bits 2-4
pub const CRA_DO_MASK: u8 = 0x1C;
/// CRA samples averaged mask, bits 5-6
pub const CRA_MA_MASK: u8 = 0x60;
/// CRA temperature sensor enable mask, bit 7 (HMC5983)
pub const CRA_TS_MASK: u8 = 0x80;
/// CRB gain mask, bits 5-7
pub const CRB_GN_MASK: u8 = 0xE0;
/// MR operating mode mask, bits 0-1
pub const MR_MD_MASK: u8 = 0x03;
/// MR serial interface mode mask, bit 2 (HMC5983)
pub const MR_SIM_MASK: u8 = 0x04;
/// MR lowest power mode mask, bit 5 (HMC5983)
pub const MR_LP_MASK: u8 = 0x20;
/// MR high speed I2C mask, bit 7 (HMC5983)
pub const MR_HS_MASK: u8 = 0x80;
/// SR ready flag mask, bit 0
pub const SR_RDY_MASK: u8 = 0x01;
/// SR lock flag mask, bit 1
pub const SR_LOCK_MASK: u8 = 0x02;
/// SR data over-written flag mask, bit 4 (HMC5983)
pub const SR_DOW_MASK: u8 = 0x10;

device_driver::create_device!(
    device_name: Hmc5883,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = BE;
        }

        /// CRA - Configuration Register A (0x00)
        /// Power-on value: 0x10 (1 sample, 15 Hz, normal measurement)
        register ConfigA {
            const ADDRESS = 0x00;
            const SIZE_BITS = 8;

            /// Measurement bias mode (0=normal, 1=positive bias, 2=negative bias)
            measurement_mode: uint = 0..2,
            /// Data output rate (0=0.75 Hz .. 6=75 Hz)
            data_output_rate: uint = 2..5,
            /// Samples averaged per output (0=1, 1=2, 2=4, 3=8)
            samples_averaged: uint = 5..7,
            /// Temperature sensor enable (HMC5983, reserved on HMC5883L)
            temperature_sensor: bool = 7,
        },

        /// CRB - Configuration Register B (0x01)
        /// Power-on value: 0x20 (gain 1, +/-1.3 Ga)
        register ConfigB {
            const ADDRESS = 0x01;
            const SIZE_BITS = 8;

            reserved_4_0: uint = 0..5,
            /// Gain configuration (0=+/-0.88 Ga .. 7=+/-8.1 Ga)
            gain: uint = 5..8,
        },

        /// MR - Mode Register (0x02)
        /// Power-on value: 0x01 (single measurement)
        register Mode {
            const ADDRESS = 0x02;
            const SIZE_BITS = 8;

            /// Operating mode (0=continuous, 1=single, 2 and 3=idle)
            operating_mode: uint = 0..2,
            /// SPI wiring (HMC5983: false=4-wire, true=3-wire)
            serial_interface: bool = 2,
            reserved_4_3: uint = 3..5,
            /// Lowest power mode (HMC5983)
            lowest_power: bool = 5,
            reserved_6: uint = 6..7,
            /// High speed I2C, 3400 kHz
            high_speed: bool = 7,
        },

        /// SR - Status Register (0x09)
        register Status {
            const ADDRESS = 0x09;
            const SIZE_BITS = 8;

            /// A complete, unread sample is available
            ready: bool = 0,
            /// Data output registers are locked until all six are read
            lock: bool = 1,
            reserved_3_2: uint = 2..4,
            /// A sample was over-written before being read (HMC5983)
            data_overwritten: bool = 4,
            reserved_7_5: uint = 5..8,
        }
    }
);

// Re-export commonly used types for convenience
pub use Hmc5883 as RegisterDevice;
