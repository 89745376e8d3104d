//! Driver for the HMC5983
//!
//! The HMC5983 is register compatible with the HMC5883L. It gives meaning to
//! bits the older chip reserves and adds a temperature sensor:
//!
//! | Field | Register | Bit |
//! |---|---|---|
//! | Temperature sensor enable | CRA | 7 |
//! | High speed I2C | MR | 7 |
//! | Lowest power mode | MR | 5 |
//! | SPI wiring (3-wire/4-wire) | MR | 2 |
//! | Data over-written | SR | 4 |
//!
//! None of these overlap the fields the base driver writes, so
//! [`Hmc5983Driver`] wraps an [`Hmc5883lDriver`] and only adds accessors.
//!
//! # Temperature
//!
//! The sensor must be enabled with
//! [`set_temperature_sensor`](Hmc5983Driver::set_temperature_sensor) before the
//! temperature registers hold meaningful data. Enabling it also turns on the
//! chip's internal temperature compensation of the magnetic readings.

use crate::config::{
    DataOutputRate, Gain, Hmc5983Config, MagConfig, MeasurementMode, OperatingMode,
    SamplesAveraged, SerialInterfaceMode, SpeedMode,
};
use crate::device::{Hmc5883lDriver, MagData, MagDataGauss, Status};
use crate::Error;
use crate::registers::{SAMPLE_LEN, TEMPERATURE_MSB};

#[cfg(not(feature = "async"))]
use crate::interface::RegisterAccess;
#[cfg(not(feature = "async"))]
use device_driver::RegisterInterface;

#[cfg(feature = "async")]
use crate::interface::AsyncRegisterAccess;

/// HMC5983 status register flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hmc5983Status {
    /// A complete, unread sample is in the data output registers
    pub ready: bool,
    /// Data output registers are locked until the current sample is fully read
    pub locked: bool,
    /// A sample was replaced by a newer one before it was read
    pub data_overwritten: bool,
}

impl From<Hmc5983Status> for Status {
    fn from(status: Hmc5983Status) -> Self {
        Self {
            ready: status.ready,
            locked: status.locked,
        }
    }
}

/// Driver for the HMC5983 3-axis digital compass with temperature sensor
pub struct Hmc5983Driver<I> {
    base: Hmc5883lDriver<I>,
}

impl<I> Hmc5983Driver<I> {
    /// Create a driver without touching the bus
    pub fn new_unchecked(interface: I) -> Self {
        Self {
            base: Hmc5883lDriver::new_unchecked(interface),
        }
    }

    /// Wrap an existing base driver
    pub const fn from_base(base: Hmc5883lDriver<I>) -> Self {
        Self { base }
    }

    /// Unwrap into the base driver
    pub fn into_base(self) -> Hmc5883lDriver<I> {
        self.base
    }

    /// The base driver, for operations not delegated here
    pub const fn base(&self) -> &Hmc5883lDriver<I> {
        &self.base
    }

    /// Mutable access to the base driver
    pub fn base_mut(&mut self) -> &mut Hmc5883lDriver<I> {
        &mut self.base
    }

    /// Consume the driver and return the underlying interface
    pub fn release(self) -> I {
        self.base.release()
    }

    /// Convert a raw temperature reading to degrees Celsius
    ///
    /// The sensor reports 128 LSB/°C with 0 at 25 °C.
    #[must_use]
    pub fn temperature_to_celsius(raw: i16) -> f64 {
        f64::from(raw) / 128.0 + 25.0
    }
}

#[cfg(not(feature = "async"))]
impl<I> Hmc5983Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new HMC5983 driver instance
    ///
    /// The HMC5983 reports the same `H43` identification as the HMC5883L.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The identification registers contain an unexpected value
    pub fn new(interface: I) -> Result<Self, Error<I::Error>> {
        Ok(Self {
            base: Hmc5883lDriver::new(interface)?,
        })
    }

    /// Apply a complete configuration, operating mode last
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn configure(&mut self, config: &Hmc5983Config) -> Result<(), Error<I::Error>> {
        self.set_temperature_sensor(config.temperature_sensor)?;
        self.base.device_mut().mode().modify(|w| {
            w.set_high_speed(config.speed_mode == SpeedMode::HighSpeed);
            w.set_lowest_power(config.lowest_power);
            w.set_serial_interface(config.serial_interface == SerialInterfaceMode::ThreeWire);
        })?;
        self.base.configure(&config.base)
    }

    /// Enable or disable the temperature sensor (CRA bit 7)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_temperature_sensor(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Temperature sensor enabled: {}", enabled);

        self.base.device_mut().config_a().modify(|w| {
            w.set_temperature_sensor(enabled);
        })?;
        Ok(())
    }

    /// Select standard or high speed I2C (MR bit 7)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_high_speed_mode(&mut self, mode: SpeedMode) -> Result<(), Error<I::Error>> {
        self.base.device_mut().mode().modify(|w| {
            w.set_high_speed(mode == SpeedMode::HighSpeed);
        })?;
        Ok(())
    }

    /// Enable or disable lowest power mode (MR bit 5)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_lowest_power_mode(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.base.device_mut().mode().modify(|w| {
            w.set_lowest_power(enabled);
        })?;
        Ok(())
    }

    /// Select 3-wire or 4-wire SPI (MR bit 2)
    ///
    /// The SIM bit is bit 2 (mask `0x04`) as on the HMC5983 datasheet, not bit 3.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_serial_interface_mode(
        &mut self,
        mode: SerialInterfaceMode,
    ) -> Result<(), Error<I::Error>> {
        self.base.device_mut().mode().modify(|w| {
            w.set_serial_interface(mode == SerialInterfaceMode::ThreeWire);
        })?;
        Ok(())
    }

    /// Read the raw temperature, both registers in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_temperature_raw(&mut self) -> Result<i16, Error<I::Error>> {
        let mut buffer = [0u8; 2];
        self.base
            .device_mut()
            .interface
            .read_register_block(TEMPERATURE_MSB, &mut buffer)?;
        Ok(i16::from_be_bytes(buffer))
    }

    /// Read the temperature in degrees Celsius
    ///
    /// Only meaningful while the temperature sensor is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn temperature(&mut self) -> Result<f64, Error<I::Error>> {
        Ok(Self::temperature_to_celsius(self.read_temperature_raw()?))
    }

    /// Read the status register, including the data over-written flag
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_status(&mut self) -> Result<Hmc5983Status, Error<I::Error>> {
        let status = self.base.device_mut().status().read()?;
        Ok(Hmc5983Status {
            ready: status.ready(),
            locked: status.lock(),
            data_overwritten: status.data_overwritten(),
        })
    }

    /// See [`Hmc5883lDriver::heading`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn heading(&mut self) -> Result<f64, Error<I::Error>> {
        self.base.heading()
    }

    /// See [`Hmc5883lDriver::read_sample`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_sample(&mut self) -> Result<[u8; SAMPLE_LEN], Error<I::Error>> {
        self.base.read_sample()
    }

    /// See [`Hmc5883lDriver::read_axes`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_axes(&mut self) -> Result<MagData, Error<I::Error>> {
        self.base.read_axes()
    }

    /// See [`Hmc5883lDriver::read_identification`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_identification(&mut self) -> Result<[u8; 3], Error<I::Error>> {
        self.base.read_identification()
    }

    /// See [`Hmc5883lDriver::read_config`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a register holds a reserved bit pattern, or
    /// a bus error if communication fails.
    pub fn read_config(&mut self) -> Result<MagConfig, Error<I::Error>> {
        self.base.read_config()
    }

    /// See [`Hmc5883lDriver::read_gain`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_gain(&mut self) -> Result<Gain, Error<I::Error>> {
        self.base.read_gain()
    }

    /// See [`Hmc5883lDriver::read_magnetic_field`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_magnetic_field(&mut self) -> Result<MagDataGauss, Error<I::Error>> {
        self.base.read_magnetic_field()
    }

    /// See [`Hmc5883lDriver::wait_for_data_ready`]
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no sample becomes ready, or a bus error if
    /// communication fails.
    pub fn wait_for_data_ready<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.base.wait_for_data_ready(delay)
    }

    /// See [`Hmc5883lDriver::single_measurement_heading`]
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the measurement never completes, or a bus error if
    /// communication fails.
    pub fn single_measurement_heading<D>(&mut self, delay: &mut D) -> Result<f64, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.base.single_measurement_heading(delay)
    }

    /// See [`Hmc5883lDriver::set_operating_mode`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), Error<I::Error>> {
        self.base.set_operating_mode(mode)
    }

    /// See [`Hmc5883lDriver::set_samples_averaged`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_samples_averaged(
        &mut self,
        samples: SamplesAveraged,
    ) -> Result<(), Error<I::Error>> {
        self.base.set_samples_averaged(samples)
    }

    /// See [`Hmc5883lDriver::set_data_output_rate`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_data_output_rate(&mut self, rate: DataOutputRate) -> Result<(), Error<I::Error>> {
        self.base.set_data_output_rate(rate)
    }

    /// See [`Hmc5883lDriver::set_measurement_mode`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_measurement_mode(&mut self, mode: MeasurementMode) -> Result<(), Error<I::Error>> {
        self.base.set_measurement_mode(mode)
    }

    /// See [`Hmc5883lDriver::set_gain`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<I::Error>> {
        self.base.set_gain(gain)
    }
}

#[cfg(feature = "async")]
impl<I> Hmc5983Driver<I>
where
    I: device_driver::AsyncRegisterInterface<AddressType = u8>,
{
    /// Create a new HMC5983 driver instance
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The identification registers contain an unexpected value
    pub async fn new(interface: I) -> Result<Self, Error<I::Error>> {
        Ok(Self {
            base: Hmc5883lDriver::new(interface).await?,
        })
    }

    /// Apply a complete configuration, operating mode last
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn configure(&mut self, config: &Hmc5983Config) -> Result<(), Error<I::Error>> {
        self.set_temperature_sensor(config.temperature_sensor)
            .await?;
        self.base
            .device_mut()
            .mode()
            .modify_async(|w| {
                w.set_high_speed(config.speed_mode == SpeedMode::HighSpeed);
                w.set_lowest_power(config.lowest_power);
                w.set_serial_interface(config.serial_interface == SerialInterfaceMode::ThreeWire);
            })
            .await?;
        self.base.configure(&config.base).await
    }

    /// Enable or disable the temperature sensor (CRA bit 7)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_temperature_sensor(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Temperature sensor enabled: {}", enabled);

        self.base
            .device_mut()
            .config_a()
            .modify_async(|w| {
                w.set_temperature_sensor(enabled);
            })
            .await?;
        Ok(())
    }

    /// Select standard or high speed I2C (MR bit 7)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_high_speed_mode(&mut self, mode: SpeedMode) -> Result<(), Error<I::Error>> {
        self.base
            .device_mut()
            .mode()
            .modify_async(|w| {
                w.set_high_speed(mode == SpeedMode::HighSpeed);
            })
            .await?;
        Ok(())
    }

    /// Enable or disable lowest power mode (MR bit 5)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_lowest_power_mode(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.base
            .device_mut()
            .mode()
            .modify_async(|w| {
                w.set_lowest_power(enabled);
            })
            .await?;
        Ok(())
    }

    /// Select 3-wire or 4-wire SPI (MR bit 2)
    ///
    /// The SIM bit is bit 2 (mask `0x04`) as on the HMC5983 datasheet, not bit 3.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_serial_interface_mode(
        &mut self,
        mode: SerialInterfaceMode,
    ) -> Result<(), Error<I::Error>> {
        self.base
            .device_mut()
            .mode()
            .modify_async(|w| {
                w.set_serial_interface(mode == SerialInterfaceMode::ThreeWire);
            })
            .await?;
        Ok(())
    }

    /// Read the raw temperature, both registers in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_temperature_raw(&mut self) -> Result<i16, Error<I::Error>> {
        let mut buffer = [0u8; 2];
        self.base
            .device_mut()
            .interface
            .read_register_block(TEMPERATURE_MSB, &mut buffer)
            .await?;
        Ok(i16::from_be_bytes(buffer))
    }

    /// Read the temperature in degrees Celsius
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn temperature(&mut self) -> Result<f64, Error<I::Error>> {
        Ok(Self::temperature_to_celsius(
            self.read_temperature_raw().await?,
        ))
    }

    /// Read the status register, including the data over-written flag
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_status(&mut self) -> Result<Hmc5983Status, Error<I::Error>> {
        let status = self.base.device_mut().status().read_async().await?;
        Ok(Hmc5983Status {
            ready: status.ready(),
            locked: status.lock(),
            data_overwritten: status.data_overwritten(),
        })
    }

    /// See [`Hmc5883lDriver::heading`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn heading(&mut self) -> Result<f64, Error<I::Error>> {
        self.base.heading().await
    }

    /// See [`Hmc5883lDriver::read_sample`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_sample(&mut self) -> Result<[u8; SAMPLE_LEN], Error<I::Error>> {
        self.base.read_sample().await
    }

    /// See [`Hmc5883lDriver::read_axes`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_axes(&mut self) -> Result<MagData, Error<I::Error>> {
        self.base.read_axes().await
    }

    /// See [`Hmc5883lDriver::read_identification`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_identification(&mut self) -> Result<[u8; 3], Error<I::Error>> {
        self.base.read_identification().await
    }

    /// See [`Hmc5883lDriver::read_config`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a register holds a reserved bit pattern, or
    /// a bus error if communication fails.
    pub async fn read_config(&mut self) -> Result<MagConfig, Error<I::Error>> {
        self.base.read_config().await
    }

    /// See [`Hmc5883lDriver::read_gain`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_gain(&mut self) -> Result<Gain, Error<I::Error>> {
        self.base.read_gain().await
    }

    /// See [`Hmc5883lDriver::read_magnetic_field`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_magnetic_field(&mut self) -> Result<MagDataGauss, Error<I::Error>> {
        self.base.read_magnetic_field().await
    }

    /// See [`Hmc5883lDriver::wait_for_data_ready`]
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no sample becomes ready, or a bus error if
    /// communication fails.
    pub async fn wait_for_data_ready<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.base.wait_for_data_ready(delay).await
    }

    /// See [`Hmc5883lDriver::single_measurement_heading`]
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the measurement never completes, or a bus error if
    /// communication fails.
    pub async fn single_measurement_heading<D>(
        &mut self,
        delay: &mut D,
    ) -> Result<f64, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.base.single_measurement_heading(delay).await
    }

    /// See [`Hmc5883lDriver::set_operating_mode`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), Error<I::Error>> {
        self.base.set_operating_mode(mode).await
    }

    /// See [`Hmc5883lDriver::set_samples_averaged`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_samples_averaged(
        &mut self,
        samples: SamplesAveraged,
    ) -> Result<(), Error<I::Error>> {
        self.base.set_samples_averaged(samples).await
    }

    /// See [`Hmc5883lDriver::set_data_output_rate`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_data_output_rate(
        &mut self,
        rate: DataOutputRate,
    ) -> Result<(), Error<I::Error>> {
        self.base.set_data_output_rate(rate).await
    }

    /// See [`Hmc5883lDriver::set_measurement_mode`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_measurement_mode(
        &mut self,
        mode: MeasurementMode,
    ) -> Result<(), Error<I::Error>> {
        self.base.set_measurement_mode(mode).await
    }

    /// See [`Hmc5883lDriver::set_gain`]
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_gain(&mut self, gain: Gain) -> Result<(), Error<I::Error>> {
        self.base.set_gain(gain).await
    }
}
