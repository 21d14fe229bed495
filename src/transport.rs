//! Addressed 16-bit register access over the sensor's two-wire bus.
//!
//! The chip exposes 16-bit registers behind 16-bit addresses; both travel
//! big-endian. A write is one 4-byte frame, a read is an address write
//! followed by a 2-byte receive. Retry policy belongs to the caller.

use embedded_hal::i2c::{Error as _, I2c};
use log::debug;

use crate::error::{BusDirection, ProgramError, TransportError};
use crate::sequence::{RegisterProgram, AR0144_I2C_ADDR};

pub struct RegisterTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> RegisterTransport<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: AR0144_I2C_ADDR,
        }
    }

    /// Write one register: `[reg_h, reg_l, val_h, val_l]` in a single frame.
    pub fn write_reg(&mut self, reg: u16, val: u16) -> Result<(), TransportError> {
        let frame = [(reg >> 8) as u8, reg as u8, (val >> 8) as u8, val as u8];
        self.i2c.write(self.address, &frame).map_err(|e| TransportError {
            reg,
            dir: BusDirection::Write,
            kind: e.kind(),
        })
    }

    /// Read one register: send the address, then receive two bytes.
    pub fn read_reg(&mut self, reg: u16) -> Result<u16, TransportError> {
        let fail = |e: I2C::Error| TransportError {
            reg,
            dir: BusDirection::Read,
            kind: e.kind(),
        };

        self.i2c
            .write(self.address, &[(reg >> 8) as u8, reg as u8])
            .map_err(fail)?;
        let mut buf = [0u8; 2];
        self.i2c.read(self.address, &mut buf).map_err(fail)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Apply a register program strictly in order, stopping at the first
    /// failure. Earlier entries stay applied on the chip and later entries
    /// are never attempted; the error names the failing entry. The chip's
    /// programs are not transactional in hardware, so no rollback is
    /// attempted here either.
    pub fn apply_program(&mut self, program: RegisterProgram) -> Result<(), ProgramError> {
        for (index, entry) in program.regs.iter().enumerate() {
            self.write_reg(entry.reg, entry.val)
                .map_err(|source| ProgramError {
                    name: program.name,
                    index,
                    source,
                })?;
        }
        debug!(
            "applied register program {} ({} entries)",
            program.name,
            program.regs.len()
        );
        Ok(())
    }

    /// Give the bus back to the caller.
    pub fn release(self) -> I2C {
        self.i2c
    }
}
