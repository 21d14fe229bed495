/*!
 * # AR0144 sensor control driver
 *
 * Brings an onsemi AR0144 image sensor from an undefined power-on state to a
 * validated, streaming state and back, over its two-wire register bus. The
 * crate programs the sensor only; pixel data travels on a separate serial
 * link it never touches.
 *
 * ## Module map
 * - `sequence`: the chip's register programs as immutable static tables
 * - `transport`: 16-bit register read/write and the ordered program runner
 * - `driver`: power/reset sequencing, identity verification, format
 *   negotiation and the idle/streaming state machine
 * - `format`: the single supported output mode and crop geometry
 * - `error`: typed errors for every operation
 * - `mock`: recording bus/pin/delay doubles for host tests
 *
 * The driver is generic over `embedded-hal` 1.0 traits (`I2c`, `OutputPin`,
 * `DelayNs`); the platform supplies the concrete bus, reset line and delay
 * source, with clocks and regulators enabled before `power_up()`.
 */

pub mod error;
pub mod format;
pub mod mock;
pub mod sequence;
pub mod transport;

mod driver;

pub use driver::{Ar0144, DeviceState, StreamPhase};
pub use error::{
    BusDirection, FormatError, IdentityError, PowerError, ProgramError, StreamError,
    TransportError,
};
pub use format::{ActiveFormat, CropRegion, CropTarget, PixelCode};
pub use sequence::{RegWrite, RegisterProgram};
pub use transport::RegisterTransport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
