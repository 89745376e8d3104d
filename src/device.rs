//! High-level driver API for the HMC5883L
//!
//! This module provides the base compass driver: configuration of the
//! measurement registers, status polling, sample reads and heading
//! computation. The [`Hmc5983Driver`](crate::Hmc5983Driver) builds on it.
//!
//! The driver holds no copy of the device configuration. Every setter is an
//! immediate read-modify-write of the field on the chip, so other bits of the
//! same register keep whatever value the device currently has.

use crate::config::{
    DataOutputRate, Gain, MagConfig, MeasurementMode, OperatingMode, SamplesAveraged,
};
use crate::heading::compute_vector_angle;
use crate::registers::{CONFIG_A, DATA_OUT_X_MSB, IDENTIFICATION_A, RegisterDevice, SAMPLE_LEN};
use crate::{Error, IDENTIFICATION};

#[cfg(not(feature = "async"))]
use crate::interface::RegisterAccess;
#[cfg(not(feature = "async"))]
use device_driver::RegisterInterface;

#[cfg(feature = "async")]
use crate::interface::AsyncRegisterAccess;

/// Longest wait for a new sample, one period at the slowest output rate (0.75 Hz)
pub(crate) const DATA_READY_TIMEOUT_MS: u32 = 1400;

/// Interval between status polls while waiting for a sample
pub(crate) const POLL_INTERVAL_MS: u32 = 1;

/// Magnetometer data (raw 16-bit values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagData {
    /// X-axis magnetic field (raw)
    pub x: i16,
    /// Y-axis magnetic field (raw)
    pub y: i16,
    /// Z-axis magnetic field (raw)
    pub z: i16,
}

impl MagData {
    /// Value an axis reports when its ADC over- or underflowed
    pub const OVERFLOW: i16 = -4096;

    /// Decode a six-byte sample block
    ///
    /// The chip lays the data output registers out as X, Z, Y, each MSB first.
    #[must_use]
    pub const fn from_sample(sample: &[u8; SAMPLE_LEN]) -> Self {
        Self {
            x: i16::from_be_bytes([sample[0], sample[1]]),
            z: i16::from_be_bytes([sample[2], sample[3]]),
            y: i16::from_be_bytes([sample[4], sample[5]]),
        }
    }

    /// Whether any axis saturated
    #[must_use]
    pub const fn has_overflow(&self) -> bool {
        self.x == Self::OVERFLOW || self.y == Self::OVERFLOW || self.z == Self::OVERFLOW
    }

    /// Heading of the horizontal (X, Y) component in degrees, `[0, 360)`
    #[must_use]
    pub fn heading(&self) -> f64 {
        compute_vector_angle(self.x, self.y)
    }

    /// Scale to gauss for the given gain
    #[must_use]
    pub fn to_gauss(&self, gain: Gain) -> MagDataGauss {
        let lsb_per_gauss = f32::from(gain.lsb_per_gauss());
        MagDataGauss {
            x: f32::from(self.x) / lsb_per_gauss,
            y: f32::from(self.y) / lsb_per_gauss,
            z: f32::from(self.z) / lsb_per_gauss,
        }
    }
}

/// Magnetometer data in gauss
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagDataGauss {
    /// X-axis magnetic field in gauss
    pub x: f32,
    /// Y-axis magnetic field in gauss
    pub y: f32,
    /// Z-axis magnetic field in gauss
    pub z: f32,
}

impl MagDataGauss {
    /// Magnitude of the field vector in gauss
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

/// Status register flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// A complete, unread sample is in the data output registers
    pub ready: bool,
    /// Some but not all data output registers were read; no new sample will
    /// be posted until the rest are read
    pub locked: bool,
}

/// Driver for the HMC5883L 3-axis digital compass
pub struct Hmc5883lDriver<I> {
    device: RegisterDevice<I>,
}

impl<I> Hmc5883lDriver<I> {
    /// Create a driver without touching the bus
    ///
    /// Use [`new`](Self::new) to also check the identification registers.
    pub fn new_unchecked(interface: I) -> Self {
        Self {
            device: RegisterDevice::new(interface),
        }
    }

    /// Consume the driver and return the underlying interface
    pub fn release(self) -> I {
        self.device.interface
    }

    /// Get a reference to the underlying register device (for advanced usage)
    pub const fn device(&self) -> &RegisterDevice<I> {
        &self.device
    }

    pub(crate) fn device_mut(&mut self) -> &mut RegisterDevice<I> {
        &mut self.device
    }
}

#[cfg(not(feature = "async"))]
impl<I> Hmc5883lDriver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new HMC5883L driver instance
    ///
    /// Reads the identification registers and checks they spell `H43`. No
    /// configuration is written; call [`configure`](Self::configure) next.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The identification registers contain an unexpected value
    pub fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut driver = Self::new_unchecked(interface);

        let id = driver.read_identification()?;
        if id != IDENTIFICATION {
            #[cfg(feature = "defmt")]
            defmt::warn!("Unexpected identification: {}", id);
            return Err(Error::InvalidDevice(id));
        }

        Ok(driver)
    }

    /// Read identification registers A, B and C
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_identification(&mut self) -> Result<[u8; 3], Error<I::Error>> {
        let mut id = [0u8; 3];
        self.device
            .interface
            .read_register_block(IDENTIFICATION_A, &mut id)?;
        Ok(id)
    }

    /// Apply a complete measurement configuration
    ///
    /// The operating mode is written last so that a continuous or single
    /// measurement starts with the new settings.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn configure(&mut self, config: &MagConfig) -> Result<(), Error<I::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Configuring magnetometer: {}", config);

        self.device.config_a().modify(|w| {
            w.set_samples_averaged(config.samples_averaged.bits());
            w.set_data_output_rate(config.data_output_rate.bits());
            w.set_measurement_mode(config.measurement_mode.bits());
        })?;
        self.set_gain(config.gain)?;
        self.set_operating_mode(config.operating_mode)
    }

    /// Read back the complete measurement configuration
    ///
    /// CRA, CRB and MR are adjacent, so this is a single block read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a register holds a reserved bit pattern, or
    /// a bus error if communication fails.
    pub fn read_config(&mut self) -> Result<MagConfig, Error<I::Error>> {
        let mut registers = [0u8; 3];
        self.device
            .interface
            .read_register_block(CONFIG_A, &mut registers)?;
        MagConfig::from_registers(registers[0], registers[1], registers[2])
            .map_err(|_| Error::InvalidConfig)
    }

    /// Set the operating mode (MR bits 0-1)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), Error<I::Error>> {
        self.device.mode().modify(|w| {
            w.set_operating_mode(mode.bits());
        })?;
        Ok(())
    }

    /// Read back the operating mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_operating_mode(&mut self) -> Result<OperatingMode, Error<I::Error>> {
        let mode = self.device.mode().read()?;
        Ok(OperatingMode::from_bits(mode.operating_mode()))
    }

    /// Set the number of samples averaged per output (CRA bits 5-6)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_samples_averaged(
        &mut self,
        samples: SamplesAveraged,
    ) -> Result<(), Error<I::Error>> {
        self.device.config_a().modify(|w| {
            w.set_samples_averaged(samples.bits());
        })?;
        Ok(())
    }

    /// Set the continuous-mode output rate (CRA bits 2-4)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_data_output_rate(&mut self, rate: DataOutputRate) -> Result<(), Error<I::Error>> {
        self.device.config_a().modify(|w| {
            w.set_data_output_rate(rate.bits());
        })?;
        Ok(())
    }

    /// Set the measurement bias mode (CRA bits 0-1)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_measurement_mode(&mut self, mode: MeasurementMode) -> Result<(), Error<I::Error>> {
        self.device.config_a().modify(|w| {
            w.set_measurement_mode(mode.bits());
        })?;
        Ok(())
    }

    /// Set the gain (CRB bits 5-7)
    ///
    /// The rest of CRB must be zero, so the register is written whole. The
    /// new gain applies from the measurement after the next one.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<I::Error>> {
        self.device.config_b().write(|w| {
            w.set_gain(gain.bits());
        })?;
        Ok(())
    }

    /// Read back the gain
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_gain(&mut self) -> Result<Gain, Error<I::Error>> {
        let config_b = self.device.config_b().read()?;
        Ok(Gain::from_bits(config_b.gain()))
    }

    /// Read the status register
    ///
    /// Reading status has no side effects on the device.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_status(&mut self) -> Result<Status, Error<I::Error>> {
        let status = self.device.status().read()?;
        Ok(Status {
            ready: status.ready(),
            locked: status.lock(),
        })
    }

    /// Read all six data output registers in one transaction
    ///
    /// The chip locks its data registers until every byte of a sample has been
    /// read, so the whole block is always read even if only some axes are
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_sample(&mut self) -> Result<[u8; SAMPLE_LEN], Error<I::Error>> {
        let mut sample = [0u8; SAMPLE_LEN];
        self.device
            .interface
            .read_register_block(DATA_OUT_X_MSB, &mut sample)?;
        Ok(sample)
    }

    /// Read one sample as raw axis values
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_axes(&mut self) -> Result<MagData, Error<I::Error>> {
        let sample = self.read_sample()?;
        Ok(MagData::from_sample(&sample))
    }

    /// Read one sample scaled to gauss with the gain currently set on the chip
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_magnetic_field(&mut self) -> Result<MagDataGauss, Error<I::Error>> {
        let gain = self.read_gain()?;
        Ok(self.read_axes()?.to_gauss(gain))
    }

    /// Read one sample and return the compass heading in degrees, `[0, 360)`
    ///
    /// This consumes the device's ready sample. Calling it again before the
    /// next measurement completes returns the previous values; poll
    /// [`read_status`](Self::read_status) when freshness matters.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn heading(&mut self) -> Result<f64, Error<I::Error>> {
        Ok(self.read_axes()?.heading())
    }

    /// Poll the status register until a new sample is ready
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no sample becomes ready within one period of the
    /// slowest output rate, or a bus error if communication fails.
    pub fn wait_for_data_ready<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        for _ in 0..(DATA_READY_TIMEOUT_MS / POLL_INTERVAL_MS) {
            if self.read_status()?.ready {
                return Ok(());
            }
            delay.delay_ms(POLL_INTERVAL_MS);
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Timed out waiting for magnetometer data");

        Err(Error::Timeout)
    }

    /// Trigger a single measurement, wait for it, and return the heading
    ///
    /// Any sample still waiting in the data output registers is read and
    /// discarded first, so the ready flag polled afterwards belongs to the
    /// measurement started here.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the measurement never completes, or a bus error if
    /// communication fails.
    pub fn single_measurement_heading<D>(&mut self, delay: &mut D) -> Result<f64, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        if self.read_status()?.ready {
            self.read_sample()?;
        }
        self.set_operating_mode(OperatingMode::Single)?;
        self.wait_for_data_ready(delay)?;
        self.heading()
    }
}

#[cfg(feature = "async")]
impl<I> Hmc5883lDriver<I>
where
    I: device_driver::AsyncRegisterInterface<AddressType = u8>,
{
    /// Create a new HMC5883L driver instance
    ///
    /// Reads the identification registers and checks they spell `H43`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The identification registers contain an unexpected value
    pub async fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut driver = Self::new_unchecked(interface);

        let id = driver.read_identification().await?;
        if id != IDENTIFICATION {
            #[cfg(feature = "defmt")]
            defmt::warn!("Unexpected identification: {}", id);
            return Err(Error::InvalidDevice(id));
        }

        Ok(driver)
    }

    /// Read identification registers A, B and C
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_identification(&mut self) -> Result<[u8; 3], Error<I::Error>> {
        let mut id = [0u8; 3];
        self.device
            .interface
            .read_register_block(IDENTIFICATION_A, &mut id)
            .await?;
        Ok(id)
    }

    /// Apply a complete measurement configuration, operating mode last
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn configure(&mut self, config: &MagConfig) -> Result<(), Error<I::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Configuring magnetometer: {}", config);

        self.device
            .config_a()
            .modify_async(|w| {
                w.set_samples_averaged(config.samples_averaged.bits());
                w.set_data_output_rate(config.data_output_rate.bits());
                w.set_measurement_mode(config.measurement_mode.bits());
            })
            .await?;
        self.set_gain(config.gain).await?;
        self.set_operating_mode(config.operating_mode).await
    }

    /// Read back the complete measurement configuration
    ///
    /// CRA, CRB and MR are adjacent, so this is a single block read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a register holds a reserved bit pattern, or
    /// a bus error if communication fails.
    pub async fn read_config(&mut self) -> Result<MagConfig, Error<I::Error>> {
        let mut registers = [0u8; 3];
        self.device
            .interface
            .read_register_block(CONFIG_A, &mut registers)
            .await?;
        MagConfig::from_registers(registers[0], registers[1], registers[2])
            .map_err(|_| Error::InvalidConfig)
    }

    /// Set the operating mode (MR bits 0-1)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), Error<I::Error>> {
        self.device
            .mode()
            .modify_async(|w| {
                w.set_operating_mode(mode.bits());
            })
            .await?;
        Ok(())
    }

    /// Read back the operating mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_operating_mode(&mut self) -> Result<OperatingMode, Error<I::Error>> {
        let mode = self.device.mode().read_async().await?;
        Ok(OperatingMode::from_bits(mode.operating_mode()))
    }

    /// Set the number of samples averaged per output (CRA bits 5-6)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_samples_averaged(
        &mut self,
        samples: SamplesAveraged,
    ) -> Result<(), Error<I::Error>> {
        self.device
            .config_a()
            .modify_async(|w| {
                w.set_samples_averaged(samples.bits());
            })
            .await?;
        Ok(())
    }

    /// Set the continuous-mode output rate (CRA bits 2-4)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_data_output_rate(
        &mut self,
        rate: DataOutputRate,
    ) -> Result<(), Error<I::Error>> {
        self.device
            .config_a()
            .modify_async(|w| {
                w.set_data_output_rate(rate.bits());
            })
            .await?;
        Ok(())
    }

    /// Set the measurement bias mode (CRA bits 0-1)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_measurement_mode(
        &mut self,
        mode: MeasurementMode,
    ) -> Result<(), Error<I::Error>> {
        self.device
            .config_a()
            .modify_async(|w| {
                w.set_measurement_mode(mode.bits());
            })
            .await?;
        Ok(())
    }

    /// Set the gain (CRB bits 5-7, other bits zero)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_gain(&mut self, gain: Gain) -> Result<(), Error<I::Error>> {
        self.device
            .config_b()
            .write_async(|w| {
                w.set_gain(gain.bits());
            })
            .await?;
        Ok(())
    }

    /// Read back the gain
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_gain(&mut self) -> Result<Gain, Error<I::Error>> {
        let config_b = self.device.config_b().read_async().await?;
        Ok(Gain::from_bits(config_b.gain()))
    }

    /// Read the status register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_status(&mut self) -> Result<Status, Error<I::Error>> {
        let status = self.device.status().read_async().await?;
        Ok(Status {
            ready: status.ready(),
            locked: status.lock(),
        })
    }

    /// Read all six data output registers in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_sample(&mut self) -> Result<[u8; SAMPLE_LEN], Error<I::Error>> {
        let mut sample = [0u8; SAMPLE_LEN];
        self.device
            .interface
            .read_register_block(DATA_OUT_X_MSB, &mut sample)
            .await?;
        Ok(sample)
    }

    /// Read one sample as raw axis values
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_axes(&mut self) -> Result<MagData, Error<I::Error>> {
        let sample = self.read_sample().await?;
        Ok(MagData::from_sample(&sample))
    }

    /// Read one sample scaled to gauss with the gain currently set on the chip
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_magnetic_field(&mut self) -> Result<MagDataGauss, Error<I::Error>> {
        let gain = self.read_gain().await?;
        Ok(self.read_axes().await?.to_gauss(gain))
    }

    /// Read one sample and return the compass heading in degrees, `[0, 360)`
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn heading(&mut self) -> Result<f64, Error<I::Error>> {
        Ok(self.read_axes().await?.heading())
    }

    /// Poll the status register until a new sample is ready
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no sample becomes ready within one period of the
    /// slowest output rate, or a bus error if communication fails.
    pub async fn wait_for_data_ready<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        for _ in 0..(DATA_READY_TIMEOUT_MS / POLL_INTERVAL_MS) {
            if self.read_status().await?.ready {
                return Ok(());
            }
            delay.delay_ms(POLL_INTERVAL_MS).await;
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Timed out waiting for magnetometer data");

        Err(Error::Timeout)
    }

    /// Trigger a single measurement, wait for it, and return the heading
    ///
    /// Any sample still waiting in the data output registers is read and
    /// discarded first, so the ready flag polled afterwards belongs to the
    /// measurement started here.
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
        if self.read_status().await?.ready {
            self.read_sample().await?;
        }
        self.set_operating_mode(OperatingMode::Single).await?;
        self.wait_for_data_ready(delay).await?;
        self.heading().await
    }
}
