//! Format/crop negotiation tests: the single supported mode, the fixed crop
//! rectangle and the busy-while-streaming rule.

use std::sync::{Arc, Mutex};

use ar0144::mock::{EventLog, MockBus, MockDelay, MockResetPin};
use ar0144::sequence;
use ar0144::{
    ActiveFormat, Ar0144, CropRegion, CropTarget, DeviceState, FormatError, PixelCode,
};

type TestDriver = Ar0144<MockBus, MockResetPin, MockDelay>;

fn attach() -> (TestDriver, Arc<Mutex<Vec<u16>>>) {
    let log = EventLog::new();
    let bus = MockBus::new(&log);
    let read_queue = bus.read_queue.clone();
    let driver = Ar0144::new(bus, MockResetPin::new(&log), MockDelay::new(&log)).expect("attach");
    (driver, read_queue)
}

fn attach_streaming() -> TestDriver {
    let (driver, read_queue) = attach();
    read_queue.lock().unwrap().push(sequence::CHIP_VERSION);
    driver.power_up().expect("power up");
    driver.start().expect("start");
    driver
}

#[test]
fn test_set_format_always_returns_the_fixed_mode() {
    let (driver, _) = attach();

    // Whatever is requested, negotiation lands on 1280x800 raw 12-bit.
    let requested = ActiveFormat {
        width: 4_096,
        height: 16,
        code: PixelCode::Srggb12,
    };
    let granted = driver.set_format(requested).expect("set format");
    assert_eq!(granted, ActiveFormat::FIXED);
    assert_eq!((granted.width, granted.height), (1280, 800));
    assert_eq!(driver.format(), ActiveFormat::FIXED);
}

#[test]
fn test_format_is_readable_in_any_state() {
    let (driver, read_queue) = attach();
    assert_eq!(driver.format(), ActiveFormat::FIXED);

    read_queue.lock().unwrap().push(sequence::CHIP_VERSION);
    driver.power_up().expect("power up");
    assert_eq!(driver.format(), ActiveFormat::FIXED);

    driver.start().expect("start");
    assert_eq!(driver.format(), ActiveFormat::FIXED);
}

#[test]
fn test_set_format_busy_while_streaming() {
    let driver = attach_streaming();

    let err = driver.set_format(Default::default()).unwrap_err();
    assert_eq!(err, FormatError::Busy);
    // The active format did not change underneath the stream.
    assert_eq!(driver.format(), ActiveFormat::FIXED);
    assert_eq!(driver.state(), DeviceState::Streaming);
}

#[test]
fn test_set_format_allowed_again_after_stop() {
    let driver = attach_streaming();
    driver.stop().expect("stop");

    let granted = driver.set_format(Default::default()).expect("set format");
    assert_eq!(granted, ActiveFormat::FIXED);
}

#[test]
fn test_crop_requires_the_crop_target() {
    let (driver, _) = attach();

    assert_eq!(driver.crop(CropTarget::Crop), Ok(CropRegion::FULL));
    assert_eq!(
        driver.crop(CropTarget::CropBounds),
        Err(FormatError::UnsupportedTarget(CropTarget::CropBounds))
    );
    assert_eq!(
        driver.crop(CropTarget::CropDefault),
        Err(FormatError::UnsupportedTarget(CropTarget::CropDefault))
    );
}

#[test]
fn test_set_crop_stores_the_full_rectangle() {
    let (driver, _) = attach();

    let requested = CropRegion {
        left: 100,
        top: 100,
        width: 320,
        height: 200,
    };
    // No optical cropping: the stored rectangle is always the full array.
    let granted = driver.set_crop(CropTarget::Crop, requested).expect("set crop");
    assert_eq!(granted, CropRegion::FULL);
    assert_eq!(driver.crop(CropTarget::Crop), Ok(CropRegion::FULL));
}

#[test]
fn test_set_crop_rejects_other_targets_and_streaming() {
    let (driver, _) = attach();
    assert_eq!(
        driver.set_crop(CropTarget::CropDefault, CropRegion::FULL),
        Err(FormatError::UnsupportedTarget(CropTarget::CropDefault))
    );

    let driver = attach_streaming();
    assert_eq!(
        driver.set_crop(CropTarget::Crop, CropRegion::FULL),
        Err(FormatError::Busy)
    );
}

#[test]
fn test_exactly_one_mode_is_enumerated() {
    assert_eq!(ActiveFormat::supported().len(), 1);
    assert_eq!(ActiveFormat::supported()[0], ActiveFormat::FIXED);
}
