//! serial-link: framed actuator commands for the motion microcontroller
//!
//! Every command travels as a 2-byte frame (action code, checksum) over a
//! byte-oriented link. The default build enables an in-process `mock` link so
//! binaries and tests run on any host; the `serial` feature adds a real
//! serial-port backend.

mod types;
pub use types::{ActuatorFrame, PortInfo, DEFAULT_BAUD_RATE};

mod error;
pub use error::{LinkError, Result};

mod traits;
pub use traits::ActuatorChannel;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{FrameLog, MockLink};

#[cfg(feature = "serial")]
mod serial;

#[cfg(feature = "serial")]
pub use serial::{SerialLink, SerialOptions};
