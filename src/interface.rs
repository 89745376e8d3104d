//! Bus interface implementations for the HMC5883L / HMC5983
//!
//! This module provides implementations of the `device-driver` traits for
//! I2C and SPI communication, plus the [`RegisterAccess`] contract the driver
//! builds on: single-register read and write, block read, and masked
//! read-modify-write.

use crate::DEVICE_ADDRESS;

use device_driver::RegisterInterface;

/// SPI read/write select bit (set for reads)
const SPI_READ: u8 = 0x80;
/// SPI address auto-increment bit (HMC5983 `MS` bit)
const SPI_AUTO_INCREMENT: u8 = 0x40;
/// Largest register block the driver transfers in one transaction
const MAX_TRANSFER: usize = 8;

/// I2C interface for the HMC5883L / HMC5983
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the fixed device address (0x1E)
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let mut compass = Hmc5883lDriver::new(interface)?;
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: DEVICE_ADDRESS,
        }
    }

    /// Create a new I2C interface with a custom device address
    ///
    /// The chip itself only answers on 0x1E; this exists for address
    /// translators and bus multiplexers.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        // The register pointer auto-increments, so one write_read covers blocks
        self.i2c.write_read(self.address, &[address], read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        debug_assert!(
            write_data.len() <= MAX_TRANSFER,
            "register write longer than {MAX_TRANSFER} bytes"
        );
        let mut buffer = [0u8; MAX_TRANSFER + 1];
        buffer[0] = address;
        let len = write_data.len().min(MAX_TRANSFER);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.i2c.write(self.address, &buffer[..=len])
    }
}

#[cfg(feature = "async")]
impl<I2C, E> device_driver::AsyncRegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal_async::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    async fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.address, &[address], read_data)
            .await
    }

    async fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        debug_assert!(
            write_data.len() <= MAX_TRANSFER,
            "register write longer than {MAX_TRANSFER} bytes"
        );
        let mut buffer = [0u8; MAX_TRANSFER + 1];
        buffer[0] = address;
        let len = write_data.len().min(MAX_TRANSFER);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.i2c.write(self.address, &buffer[..=len]).await
    }
}

/// SPI interface for the HMC5983
///
/// The HMC5883L is I2C only. The HMC5983 additionally speaks SPI mode 3; the
/// first byte of every transfer carries the read bit (bit 7), the address
/// auto-increment bit (bit 6) and the register address (bits 0-5).
///
/// Chip select is owned by the `SpiDevice` implementation, e.g.
/// `embedded_hal_bus::spi::ExclusiveDevice`.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Create a new SPI interface with the given SPI device
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume the interface and return the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

/// Command byte for an SPI transfer of `len` bytes starting at `address`
const fn spi_command(address: u8, read: bool, len: usize) -> u8 {
    let mut command = address & 0x3F;
    if read {
        command |= SPI_READ;
    }
    if len > 1 {
        command |= SPI_AUTO_INCREMENT;
    }
    command
}

impl<SPI, E> RegisterInterface for SpiInterface<SPI>
where
    SPI: embedded_hal::spi::SpiDevice<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let command = [spi_command(address, true, read_data.len())];
        let mut operations = [
            embedded_hal::spi::Operation::Write(&command),
            embedded_hal::spi::Operation::Read(read_data),
        ];

        self.spi.transaction(&mut operations)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        debug_assert!(
            write_data.len() <= MAX_TRANSFER,
            "register write longer than {MAX_TRANSFER} bytes"
        );
        let mut buffer = [0u8; MAX_TRANSFER + 1];
        let len = write_data.len().min(MAX_TRANSFER);
        buffer[0] = spi_command(address, false, len);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.spi.write(&buffer[..=len])
    }
}

#[cfg(feature = "async")]
impl<SPI, E> device_driver::AsyncRegisterInterface for SpiInterface<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    async fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let command = [spi_command(address, true, read_data.len())];
        let mut operations = [
            embedded_hal_async::spi::Operation::Write(&command),
            embedded_hal_async::spi::Operation::Read(read_data),
        ];

        self.spi.transaction(&mut operations).await
    }

    async fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        debug_assert!(
            write_data.len() <= MAX_TRANSFER,
            "register write longer than {MAX_TRANSFER} bytes"
        );
        let mut buffer = [0u8; MAX_TRANSFER + 1];
        let len = write_data.len().min(MAX_TRANSFER);
        buffer[0] = spi_command(address, false, len);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.spi.write(&buffer[..=len]).await
    }
}

/// Register access contract
///
/// Every [`RegisterInterface`] with 8-bit addresses gets these operations.
/// Transport errors are returned unchanged and nothing is retried.
pub trait RegisterAccess: RegisterInterface<AddressType = u8> {
    /// Read a single register
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus transaction fails.
    fn read_register_u8(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.read_register(address, 8, &mut value)?;
        Ok(value[0])
    }

    /// Overwrite a single register
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus transaction fails.
    fn write_register_u8(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.write_register(address, 8, &[value])
    }

    /// Read `buffer.len()` consecutive registers in one transaction
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus transaction fails.
    fn read_register_block(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let size_bits = u32::try_from(buffer.len() * 8).unwrap_or(u32::MAX);
        self.read_register(address, size_bits, buffer)
    }

    /// Replace the bits selected by `mask` with `value`, leaving the rest intact
    ///
    /// `value` must already be shifted to the field position; bits outside
    /// `mask` are ignored.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the read or the write fails.
    fn configure_register_bits(
        &mut self,
        address: u8,
        mask: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        let current = self.read_register_u8(address)?;
        self.write_register_u8(address, (current & !mask) | (value & mask))
    }
}

impl<T> RegisterAccess for T where T: RegisterInterface<AddressType = u8> {}

/// Async flavour of [`RegisterAccess`]
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait AsyncRegisterAccess: device_driver::AsyncRegisterInterface<AddressType = u8> {
    /// Read a single register
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus transaction fails.
    async fn read_register_u8(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.read_register(address, 8, &mut value).await?;
        Ok(value[0])
    }

    /// Overwrite a single register
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus transaction fails.
    async fn write_register_u8(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.write_register(address, 8, &[value]).await
    }

    /// Read `buffer.len()` consecutive registers in one transaction
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus transaction fails.
    async fn read_register_block(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        let size_bits = u32::try_from(buffer.len() * 8).unwrap_or(u32::MAX);
        self.read_register(address, size_bits, buffer).await
    }

    /// Replace the bits selected by `mask` with `value`, leaving the rest intact
    ///
    /// # Errors
    ///
    /// Returns the transport error if the read or the write fails.
    async fn configure_register_bits(
        &mut self,
        address: u8,
        mask: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        let current = self.read_register_u8(address).await?;
        self.write_register_u8(address, (current & !mask) | (value & mask))
            .await
    }
}

#[cfg(feature = "async")]
impl<T> AsyncRegisterAccess for T where
    T: device_driver::AsyncRegisterInterface<AddressType = u8>
{
}
