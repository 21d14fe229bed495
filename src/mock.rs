//! Test doubles for the bus, the reset line and the delay provider.
//!
//! All three record into one shared [`EventLog`], so tests can assert strict
//! ordering across collaborators (a settle delay before the identity read,
//! the PLL lock wait between programs). Failure injection follows the same
//! shape as the real bus: a write NACKs, a read times out.

use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

/// One observable side effect of the driver, in occurrence order. A failed
/// register write is still recorded: the attempt reached the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Write { reg: u16, val: u16 },
    Read { reg: u16 },
    DelayUs(u32),
    ResetAssert,
    ResetDeassert,
}

/// Shared recorder handed to all three doubles.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<BusEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: BusEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<BusEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Just the register writes, in order.
    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::Write { reg, val } => Some((reg, val)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Bus-level mock error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError(pub i2c::ErrorKind);

impl i2c::Error for MockBusError {
    fn kind(&self) -> i2c::ErrorKind {
        self.0
    }
}

/// Mock register bus. Decodes the sensor's frame layout (4-byte register
/// write, 2-byte address then 2-byte receive for a read) into [`BusEvent`]s
/// and also keeps the raw sent frames for byte-layout assertions.
pub struct MockBus {
    log: EventLog,
    /// Raw frames sent on the bus, including read address preludes.
    pub sent_frames: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Values returned by register reads, front first. An empty queue
    /// reads as 0x0000.
    pub read_queue: Arc<Mutex<Vec<u16>>>,
    /// NACK the nth register write (0-based, counting register writes only).
    pub fail_write_at: Arc<Mutex<Option<usize>>>,
    /// Time out every register read.
    pub fail_reads: Arc<Mutex<bool>>,
    writes_seen: usize,
    pending_read_reg: Option<u16>,
}

impl MockBus {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            sent_frames: Arc::new(Mutex::new(Vec::new())),
            read_queue: Arc::new(Mutex::new(Vec::new())),
            fail_write_at: Arc::new(Mutex::new(None)),
            fail_reads: Arc::new(Mutex::new(false)),
            writes_seen: 0,
            pending_read_reg: None,
        }
    }

    /// Queue a value for the next register read.
    pub fn queue_read_value(&self, val: u16) {
        self.read_queue.lock().unwrap().push(val);
    }

    /// NACK the nth register write.
    pub fn fail_write_at(&self, index: usize) {
        *self.fail_write_at.lock().unwrap() = Some(index);
    }

    /// Time out register reads.
    pub fn set_read_error(&self, enable: bool) {
        *self.fail_reads.lock().unwrap() = enable;
    }

    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent_frames.lock().unwrap().clone()
    }
}

impl ErrorType for MockBus {
    type Error = MockBusError;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        _address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.sent_frames.lock().unwrap().push(bytes.to_vec());
                    match bytes.len() {
                        // Full register write frame.
                        4 => {
                            let reg = u16::from_be_bytes([bytes[0], bytes[1]]);
                            let val = u16::from_be_bytes([bytes[2], bytes[3]]);
                            let nth = self.writes_seen;
                            self.writes_seen += 1;
                            self.log.push(BusEvent::Write { reg, val });
                            if *self.fail_write_at.lock().unwrap() == Some(nth) {
                                return Err(MockBusError(i2c::ErrorKind::NoAcknowledge(
                                    NoAcknowledgeSource::Data,
                                )));
                            }
                        }
                        // Address prelude of a register read.
                        2 => {
                            self.pending_read_reg =
                                Some(u16::from_be_bytes([bytes[0], bytes[1]]));
                        }
                        _ => return Err(MockBusError(i2c::ErrorKind::Other)),
                    }
                }
                Operation::Read(buf) => {
                    if *self.fail_reads.lock().unwrap() {
                        return Err(MockBusError(i2c::ErrorKind::NoAcknowledge(
                            NoAcknowledgeSource::Address,
                        )));
                    }
                    let reg = self.pending_read_reg.take().unwrap_or(0);
                    self.log.push(BusEvent::Read { reg });
                    let mut queue = self.read_queue.lock().unwrap();
                    let val = if queue.is_empty() { 0 } else { queue.remove(0) };
                    let bytes = val.to_be_bytes();
                    let n = 2.min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                }
            }
        }
        Ok(())
    }
}

/// Reset-line mock error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Mock reset line. High is logically asserted, matching the driver.
pub struct MockResetPin {
    log: EventLog,
    /// Fail the next level change, once.
    pub fail_next: Arc<Mutex<bool>>,
}

impl MockResetPin {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    pub fn fail_next_set(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    fn take_failure(&self) -> bool {
        std::mem::take(&mut *self.fail_next.lock().unwrap())
    }
}

impl digital::ErrorType for MockResetPin {
    type Error = MockPinError;
}

impl OutputPin for MockResetPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.take_failure() {
            return Err(MockPinError);
        }
        self.log.push(BusEvent::ResetAssert);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.take_failure() {
            return Err(MockPinError);
        }
        self.log.push(BusEvent::ResetDeassert);
        Ok(())
    }
}

/// Mock delay provider; records each wait in microseconds.
pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(BusEvent::DelayUs(ns / 1_000));
    }
}
