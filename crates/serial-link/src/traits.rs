use crate::{ActuatorFrame, PortInfo, Result};

/// A minimal blocking actuator link.
pub trait ActuatorChannel {
    /// Open a link by address (e.g., "/dev/ttyUSB0", "COM3") at the given baud rate.
    fn open(address: &str, baud_rate: u32) -> Result<Self>
    where
        Self: Sized;

    /// Attempt to list available ports for this backend.
    fn list() -> Result<Vec<PortInfo>>
    where
        Self: Sized;

    /// Send one frame. Returns only after the bytes were written and flushed.
    fn send(&mut self, frame: &ActuatorFrame) -> Result<()>;

    /// Release the link.
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}
