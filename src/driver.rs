//! The sensor control sequencer: power/reset, identity verification, format
//! negotiation and the idle/streaming state machine.
//!
//! One mutex per device serializes every control operation, delays included,
//! so a format change can never interleave with a stream start on the same
//! chip. All calls are synchronous blocking calls on the invoking thread.

use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::i2c::I2c;
use log::{error, info, warn};

use crate::error::{FormatError, IdentityError, PowerError, StreamError};
use crate::format::{ActiveFormat, CropRegion, CropTarget};
use crate::sequence::{self, RegisterProgram, CHIP_VERSION, REG_CHIP_VERSION};
use crate::transport::RegisterTransport;

/// Control states of an attached sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Before the reset line has been claimed. Not observable through a
    /// constructed driver; construction asserts reset and moves on.
    Uninitialized,
    /// Reset asserted, no configuration on the chip.
    PoweredDown,
    /// Identity verified and baseline settings applied.
    Verified,
    /// Stream programs applied at least once; chip idle.
    Configured,
    /// Video output active.
    Streaming,
    /// A register program failed partway through; the chip's configuration
    /// is indeterminate. Terminal until a fresh power-up sequence.
    Faulted,
}

/// Phases of the streaming transitions, in the hardware-mandated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Pll,
    LaneFormat,
    Geometry,
    Binning,
    EmbeddedData,
    StartCommand,
    StopCommand,
}

/// Reset must stay asserted for more than 1 ms.
const RESET_HOLD_MS: u32 = 2;
/// Post-reset settle floor when the input clock rate is unknown.
const DEFAULT_SETTLE_US: u32 = 10_000;
/// The chip needs this many input-clock cycles after reset deasserts before
/// its registers are guaranteed readable.
const SETTLE_CLOCK_CYCLES: u64 = 160_000;
/// Empirical wait for PLL lock before lane timing is programmed.
const PLL_LOCK_MS: u32 = 100;

/// Settle wait derived from the actual input clock, with a 1 ms guard band.
/// A zero rate falls back to the conservative default, and the wait
/// saturates rather than truncates for clocks too slow to be real.
fn settle_us_for_clock(hz: u32) -> u32 {
    if hz == 0 {
        return DEFAULT_SETTLE_US;
    }
    let us = (SETTLE_CLOCK_CYCLES * 1_000_000).div_ceil(u64::from(hz));
    u32::try_from(us).unwrap_or(u32::MAX).saturating_add(1_000)
}

struct Inner<I2C, RST, D> {
    bus: RegisterTransport<I2C>,
    reset: RST,
    delay: D,
    state: DeviceState,
    format: ActiveFormat,
    crop: CropRegion,
    settle_us: u32,
}

impl<I2C, RST, D> Inner<I2C, RST, D>
where
    I2C: I2c,
    RST: OutputPin,
    D: DelayNs,
{
    fn assert_reset(&mut self) -> Result<(), PowerError> {
        self.reset
            .set_high()
            .map_err(|e| PowerError::ResetPin(e.kind()))
    }

    fn deassert_reset(&mut self) -> Result<(), PowerError> {
        self.reset
            .set_low()
            .map_err(|e| PowerError::ResetPin(e.kind()))
    }

    /// One read of the chip version register against the expected constant.
    /// Precondition: the post-reset settle delay has elapsed; earlier reads
    /// can return stale data.
    fn verify_identity(&mut self) -> Result<(), IdentityError> {
        let actual = self.bus.read_reg(REG_CHIP_VERSION)?;
        if actual != CHIP_VERSION {
            error!(
                "wrong chip id 0x{:04X}, expected 0x{:04X}",
                actual, CHIP_VERSION
            );
            return Err(IdentityError::Mismatch {
                expected: CHIP_VERSION,
                actual,
            });
        }
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), PowerError> {
        if self.state == DeviceState::Streaming {
            return Err(PowerError::InvalidState(self.state));
        }

        self.assert_reset()?;
        self.state = DeviceState::PoweredDown;
        self.delay.delay_ms(RESET_HOLD_MS);
        self.deassert_reset()?;
        self.delay.delay_us(self.settle_us);

        // Identity failure means the chip is absent or the wrong part; no
        // register was written, so the device stays powered down.
        self.verify_identity()?;
        info!("AR0144 detected, chip id 0x{:04X}", CHIP_VERSION);

        self.bus
            .apply_program(sequence::REV4_RECOMMENDED)
            .map_err(|e| {
                self.state = DeviceState::Faulted;
                PowerError::Program(e)
            })?;
        self.state = DeviceState::Verified;
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), PowerError> {
        if self.state == DeviceState::Streaming {
            // Controlled transition: stop the stream before pulling reset.
            // If the stop write fails the reset assertion below puts the
            // chip in a known state anyway.
            if let Err(e) = self.bus.apply_program(sequence::STOP_STREAM) {
                warn!("stop-stream before power down failed, relying on reset: {e}");
            }
        }
        self.assert_reset()?;
        self.state = DeviceState::PoweredDown;
        info!("sensor powered down");
        Ok(())
    }

    fn run_phase(
        &mut self,
        phase: StreamPhase,
        program: RegisterProgram,
    ) -> Result<(), StreamError> {
        self.bus.apply_program(program).map_err(|source| {
            self.state = DeviceState::Faulted;
            StreamError::Phase { phase, source }
        })
    }

    fn start(&mut self) -> Result<(), StreamError> {
        match self.state {
            DeviceState::Verified | DeviceState::Configured => {}
            other => return Err(StreamError::InvalidState(other)),
        }

        // Hardware contract, order is load-bearing: the PLL must lock before
        // lane timing is programmed, lane/format must precede geometry, and
        // embedded data toggling alters the line counts the start command
        // depends on.
        self.run_phase(StreamPhase::Pll, sequence::PLL_27MHZ)?;
        self.delay.delay_ms(PLL_LOCK_MS);
        self.run_phase(StreamPhase::LaneFormat, sequence::MIPI_2LANE_12BIT)?;
        self.run_phase(StreamPhase::Geometry, sequence::RES_1280X800_60FPS)?;
        self.run_phase(StreamPhase::Binning, sequence::CONTEXT_B_2X2_BINNING)?;
        self.run_phase(StreamPhase::EmbeddedData, sequence::EMBEDDED_DATA_STATS)?;
        self.run_phase(StreamPhase::StartCommand, sequence::START_STREAM)?;

        self.state = DeviceState::Streaming;
        info!("streaming started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), StreamError> {
        if self.state != DeviceState::Streaming {
            return Err(StreamError::InvalidState(self.state));
        }
        // On a transport failure the chip's output state is unknown; the
        // run_phase helper has already marked the device faulted.
        self.run_phase(StreamPhase::StopCommand, sequence::STOP_STREAM)?;
        self.state = DeviceState::Configured;
        info!("streaming stopped");
        Ok(())
    }

    fn set_format(&mut self, _requested: ActiveFormat) -> Result<ActiveFormat, FormatError> {
        if self.state == DeviceState::Streaming {
            return Err(FormatError::Busy);
        }
        // Negotiation always lands on the one supported mode.
        self.format = ActiveFormat::FIXED;
        Ok(self.format)
    }

    fn crop(&self, target: CropTarget) -> Result<CropRegion, FormatError> {
        if target != CropTarget::Crop {
            return Err(FormatError::UnsupportedTarget(target));
        }
        Ok(self.crop)
    }

    fn set_crop(
        &mut self,
        target: CropTarget,
        _requested: CropRegion,
    ) -> Result<CropRegion, FormatError> {
        if self.state == DeviceState::Streaming {
            return Err(FormatError::Busy);
        }
        if target != CropTarget::Crop {
            return Err(FormatError::UnsupportedTarget(target));
        }
        self.crop = CropRegion::FULL;
        Ok(self.crop)
    }
}

/// An attached AR0144, generic over the bus, the reset line and the delay
/// provider.
///
/// The reset line is treated as logically asserted when driven high; wiring
/// polarity belongs to the [`OutputPin`] implementation, as it does not vary
/// per chip revision. The input clock and any regulators must be enabled by
/// the caller before [`Ar0144::power_up`].
pub struct Ar0144<I2C, RST, D> {
    inner: Mutex<Inner<I2C, RST, D>>,
}

impl<I2C, RST, D> Ar0144<I2C, RST, D>
where
    I2C: I2c,
    RST: OutputPin,
    D: DelayNs,
{
    /// Attach to the sensor: claims the reset line (asserted) before any bus
    /// traffic, leaving the device powered down.
    pub fn new(i2c: I2C, reset: RST, delay: D) -> Result<Self, PowerError> {
        let mut inner = Inner {
            bus: RegisterTransport::new(i2c),
            reset,
            delay,
            state: DeviceState::Uninitialized,
            format: ActiveFormat::FIXED,
            crop: CropRegion::FULL,
            settle_us: DEFAULT_SETTLE_US,
        };
        inner.assert_reset()?;
        inner.state = DeviceState::PoweredDown;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Derive the post-reset settle wait from the actual input clock rate
    /// instead of the conservative fixed default. A rate of zero keeps the
    /// default wait.
    pub fn with_input_clock(self, hz: u32) -> Self {
        let mut inner = self
            .inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        inner.settle_us = settle_us_for_clock(hz);
        Self {
            inner: Mutex::new(inner),
        }
    }

    // The guarded tuple is plain data and every failure path lands in an
    // explicit state, so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Inner<I2C, RST, D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current control state.
    pub fn state(&self) -> DeviceState {
        self.lock().state
    }

    /// Full power-up sequence: reset pulse, settle wait, identity check,
    /// baseline settings. On success the device is `Verified`. An identity
    /// or reset failure leaves it `PoweredDown`; a failure while applying
    /// the baseline program leaves it `Faulted`. Not valid while streaming.
    pub fn power_up(&self) -> Result<(), PowerError> {
        self.lock().power_up()
    }

    /// Assert reset and return to `PoweredDown`, forcing a stream stop
    /// first if video output is active.
    pub fn power_down(&self) -> Result<(), PowerError> {
        self.lock().power_down()
    }

    /// Re-check the identity register. Valid once a power-up sequence has
    /// run; calling it before the settle delay has elapsed is a caller
    /// error and can read stale data.
    pub fn verify(&self) -> Result<(), IdentityError> {
        self.lock().verify_identity()
    }

    /// The active output format. Readable in any state.
    pub fn format(&self) -> ActiveFormat {
        self.lock().format
    }

    /// Negotiate the output format. The request is taken as a hint only:
    /// exactly one mode is supported and it is returned deterministically.
    /// Fails with [`FormatError::Busy`] while streaming.
    pub fn set_format(&self, requested: ActiveFormat) -> Result<ActiveFormat, FormatError> {
        self.lock().set_format(requested)
    }

    /// The crop rectangle for the given selection target.
    pub fn crop(&self, target: CropTarget) -> Result<CropRegion, FormatError> {
        self.lock().crop(target)
    }

    /// Set the crop rectangle. Only the crop target is supported and the
    /// stored rectangle is always the full array.
    pub fn set_crop(
        &self,
        target: CropTarget,
        requested: CropRegion,
    ) -> Result<CropRegion, FormatError> {
        self.lock().set_crop(target, requested)
    }

    /// Transition to streaming: PLL, lock wait, lane/format, geometry,
    /// binning, embedded data, start command — strictly in that order. Any
    /// phase failure aborts the rest and leaves the device `Faulted`.
    pub fn start(&self) -> Result<(), StreamError> {
        self.lock().start()
    }

    /// Transition back to idle with the stop-stream command. On success the
    /// device is `Configured`; on a transport failure it is `Faulted`, since
    /// the chip's actual output state is then unknown.
    pub fn stop(&self) -> Result<(), StreamError> {
        self.lock().stop()
    }

    /// Detach: power down (reset re-asserted) and hand back the bus, reset
    /// line and delay provider.
    pub fn release(self) -> Result<(I2C, RST, D), PowerError> {
        let mut inner = self
            .inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        inner.power_down()?;
        let Inner {
            bus, reset, delay, ..
        } = inner;
        Ok((bus.release(), reset, delay))
    }
}
