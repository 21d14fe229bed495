//! Error types for the sensor control core.
//!
//! Every public operation returns a typed result; a failure always leaves the
//! device state consistent with what the caller was told. Bus failures are
//! carried as the standard `embedded-hal` error kinds so these types stay
//! non-generic over the concrete bus.

use embedded_hal::{digital, i2c};

use crate::driver::{DeviceState, StreamPhase};
use crate::format::CropTarget;

/// Direction of a failing register transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDirection {
    Read,
    Write,
}

/// A single register transaction failed on the bus (NACK, timeout, short
/// transfer). Never retried at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("i2c {dir:?} of register 0x{reg:04X} failed: {kind}")]
pub struct TransportError {
    pub reg: u16,
    pub dir: BusDirection,
    pub kind: i2c::ErrorKind,
}

/// A register program aborted partway through. Entries before `index` are
/// applied on the chip, entries after it were never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("register program {name} aborted at entry {index}: {source}")]
pub struct ProgramError {
    pub name: &'static str,
    pub index: usize,
    #[source]
    pub source: TransportError,
}

/// The chip did not identify as an AR0144.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("wrong chip id 0x{actual:04X}, expected 0x{expected:04X}")]
    Mismatch { expected: u16, actual: u16 },

    #[error("chip id read failed: {0}")]
    Transport(#[from] TransportError),
}

/// The power sequence could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PowerError {
    #[error("power sequence not valid while {0:?}")]
    InvalidState(DeviceState),

    #[error("reset line error: {0}")]
    ResetPin(digital::ErrorKind),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("baseline configuration failed: {0}")]
    Program(#[from] ProgramError),
}

/// A format or crop request was rejected. Recoverable: the caller may retry
/// after stopping the stream or with a supported target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("format/crop changes are not allowed while streaming")]
    Busy,

    #[error("unsupported selection target {0:?}")]
    UnsupportedTarget(CropTarget),
}

/// A streaming transition failed. A phase failure leaves the device
/// `Faulted`; only a fresh power-up sequence recovers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("stream transition not valid while {0:?}")]
    InvalidState(DeviceState),

    #[error("{phase:?} phase failed: {source}")]
    Phase {
        phase: StreamPhase,
        #[source]
        source: ProgramError,
    },
}
