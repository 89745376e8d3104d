//! Common test utilities and mock implementations

#![allow(dead_code)]

pub mod mock_interface;

pub use mock_interface::{MockInterface, Operation};
pub use test_utils::{assert_float_eq, create_mock_driver, create_mock_hmc5983};
