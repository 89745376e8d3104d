//! Sample read tests

use crate::common::{Operation, create_mock_driver, create_mock_hmc5983, test_utils};
use hmc5883::MagData;

#[test]
fn test_sample_is_one_six_byte_transaction() {
    let (mut driver, interface) = create_mock_driver();

    interface.post_sample(100, -200, 300);
    interface.clear_operations();

    driver.read_axes().unwrap();

    assert_eq!(
        interface.operations(),
        vec![Operation::Read {
            address: 0x03,
            len: 6
        }]
    );
}

#[test]
fn test_axes_decoded_from_x_z_y_layout() {
    let (mut driver, interface) = create_mock_driver();

    interface.post_sample(100, -200, 300);
    let data = driver.read_axes().unwrap();

    assert_eq!(
        data,
        MagData {
            x: 100,
            y: -200,
            z: 300
        }
    );
}

#[test]
fn test_raw_sample_bytes_are_msb_first() {
    let (mut driver, interface) = create_mock_driver();

    interface.post_sample(0x0102, 0x0506, 0x0304);
    let sample = driver.read_sample().unwrap();

    assert_eq!(sample, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
}

#[test]
fn test_full_read_clears_ready() {
    let (mut driver, interface) = create_mock_driver();

    interface.post_sample(1, 2, 3);
    assert!(driver.read_status().unwrap().ready);

    driver.read_axes().unwrap();

    let status = driver.read_status().unwrap();
    assert!(!status.ready, "Ready flag should clear after a full read");
    assert!(!status.locked, "A full read must not leave the registers locked");
}

#[test]
fn test_overflow_sample_detected() {
    let (mut driver, interface) = create_mock_driver();

    interface.post_sample(MagData::OVERFLOW, 10, 10);
    let data = driver.read_axes().unwrap();

    assert!(data.has_overflow());
}

#[test]
fn test_magnetic_field_uses_gain_on_chip() {
    let (mut driver, interface) = create_mock_driver();

    // Power-on gain is 1090 LSB/Ga
    interface.post_sample(1090, -545, 0);
    let field = driver.read_magnetic_field().unwrap();
    test_utils::assert_float_eq(f64::from(field.x), 1.0, 1e-6);
    test_utils::assert_float_eq(f64::from(field.y), -0.5, 1e-6);
    test_utils::assert_float_eq(f64::from(field.z), 0.0, 1e-6);

    // Gain 7 is 230 LSB/Ga
    interface.set_register(0x01, 0xE0);
    interface.post_sample(230, 0, 460);
    let field = driver.read_magnetic_field().unwrap();
    test_utils::assert_float_eq(f64::from(field.x), 1.0, 1e-6);
    test_utils::assert_float_eq(f64::from(field.z), 2.0, 1e-6);
}

#[test]
fn test_hmc5983_reads_same_sample_block() {
    let (mut driver, interface) = create_mock_hmc5983();

    interface.post_sample(-1, 2, -3);
    let data = driver.read_axes().unwrap();

    assert_eq!(data, MagData { x: -1, y: 2, z: -3 });
}
