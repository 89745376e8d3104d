//! Mock interface implementation for testing the HMC5883L / HMC5983 driver

#[cfg(feature = "async")]
use device_driver::AsyncRegisterInterface;
use device_driver::RegisterInterface;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Mode register address
pub const MR: u8 = 0x02;

/// Status register address
pub const SR: u8 = 0x09;

/// First and last data output register
const DATA_FIRST: u8 = 0x03;
const DATA_LAST: u8 = 0x08;

/// Records operations performed on the mock interface
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// One read transaction
    Read {
        /// First register address
        address: u8,
        /// Number of bytes read
        len: usize,
    },
    /// One register write
    Write {
        /// Register address
        address: u8,
        /// Value that was written
        value: u8,
    },
}

/// Shared state for mock interface (uses interior mutability)
#[derive(Debug)]
struct MockState {
    /// Simulated register file
    registers: HashMap<u8, u8>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Sample produced by the next single measurement trigger
    next_measurement: Option<(i16, i16, i16)>,

    /// Failure injection flags
    fail_next_read: bool,
    fail_next_write: bool,
}

impl MockState {
    fn new() -> Self {
        let mut state = Self {
            registers: HashMap::new(),
            operations: Vec::new(),
            next_measurement: None,
            fail_next_read: false,
            fail_next_write: false,
        };

        // Power-on register values
        state.registers.insert(0x00, 0x10); // CRA: 1 sample, 15 Hz, normal
        state.registers.insert(0x01, 0x20); // CRB: gain 1
        state.registers.insert(0x02, 0x01); // MR: single measurement
        state.registers.insert(0x0A, b'H');
        state.registers.insert(0x0B, b'4');
        state.registers.insert(0x0C, b'3');

        state
    }

    fn get(&self, address: u8) -> u8 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    /// Post a new X/Z/Y sample and raise the ready flag
    fn post_sample(&mut self, x: i16, y: i16, z: i16) {
        let [x_h, x_l] = x.to_be_bytes();
        let [z_h, z_l] = z.to_be_bytes();
        let [y_h, y_l] = y.to_be_bytes();

        self.registers.insert(0x03, x_h);
        self.registers.insert(0x04, x_l);
        self.registers.insert(0x05, z_h);
        self.registers.insert(0x06, z_l);
        self.registers.insert(0x07, y_h);
        self.registers.insert(0x08, y_l);

        let status = self.get(SR);
        self.registers.insert(SR, status | 0x01);
    }

    /// Writing single mode to MR completes the queued measurement
    fn trigger_measurement(&mut self, address: u8, value: u8) {
        if address == MR && value & 0x03 == 0x01 {
            if let Some((x, y, z)) = self.next_measurement.take() {
                self.post_sample(x, y, z);
            }
        }
    }

    /// Apply the chip's data register locking after a read of `[first, last]`
    fn update_lock(&mut self, first: u8, last: u8) {
        let touches_data = first <= DATA_LAST && last >= DATA_FIRST;
        if !touches_data {
            return;
        }

        let status = self.get(SR);
        if first <= DATA_FIRST && last >= DATA_LAST {
            // Whole sample drained: not ready, unlocked
            self.registers.insert(SR, status & !0x03);
        } else {
            self.registers.insert(SR, status | 0x02);
        }
    }
}

/// Mock interface for testing
#[derive(Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
}

impl MockInterface {
    /// Create a new mock interface with power-on register values
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
        }
    }

    /// Set a register value
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers.insert(address, value);
    }

    /// Get a register value
    pub fn get_register(&self, address: u8) -> u8 {
        self.state.borrow().get(address)
    }

    /// Overwrite the identification registers
    pub fn set_identification(&self, id: [u8; 3]) {
        self.set_register(0x0A, id[0]);
        self.set_register(0x0B, id[1]);
        self.set_register(0x0C, id[2]);
    }

    /// Post a new sample (will be returned on next read) and set RDY
    pub fn post_sample(&self, x: i16, y: i16, z: i16) {
        self.state.borrow_mut().post_sample(x, y, z);
    }

    /// Queue the sample the next single measurement will produce
    pub fn queue_measurement(&self, x: i16, y: i16, z: i16) {
        self.state.borrow_mut().next_measurement = Some((x, y, z));
    }

    /// Set the raw temperature registers (HMC5983)
    pub fn set_temperature_data(&self, raw: i16) {
        let [high, low] = raw.to_be_bytes();
        self.set_register(0x31, high);
        self.set_register(0x32, low);
    }

    /// Inject a read failure on the next read operation
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Inject a write failure on the next write operation
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Get the operations log
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Clear the operations log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Count write operations
    pub fn write_count(&self) -> usize {
        self.state
            .borrow()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }
}

/// Mock error type
#[derive(Debug, Clone, PartialEq)]
pub enum MockError {
    /// Simulated communication error
    Communication,
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }

        for (i, byte) in read_data.iter_mut().enumerate() {
            *byte = state.get(address.wrapping_add(i as u8));
        }

        state.operations.push(Operation::Read {
            address,
            len: read_data.len(),
        });

        let last = address.wrapping_add(read_data.len().saturating_sub(1) as u8);
        state.update_lock(address, last);

        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Communication);
        }

        for (i, &value) in write_data.iter().enumerate() {
            let reg_addr = address.wrapping_add(i as u8);
            state.registers.insert(reg_addr, value);
            state.trigger_measurement(reg_addr, value);
            state.operations.push(Operation::Write {
                address: reg_addr,
                value,
            });
        }

        Ok(())
    }
}

#[cfg(feature = "async")]
impl AsyncRegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    async fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        // Delegate to synchronous implementation
        RegisterInterface::read_register(self, address, size_bits, read_data)
    }

    async fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        // Delegate to synchronous implementation
        RegisterInterface::write_register(self, address, size_bits, write_data)
    }
}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}
