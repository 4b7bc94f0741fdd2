use crate::{ActuatorChannel, ActuatorFrame, LinkError, PortInfo, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared record of every frame a [`MockLink`] accepted.
///
/// Clones observe the same log, so a test can keep one handle while the link
/// itself is moved into a dispatcher.
#[derive(Clone, Debug, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<Vec<ActuatorFrame>>>,
}

impl FrameLog {
    pub fn frames(&self) -> Vec<ActuatorFrame> {
        self.frames.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }

    fn push(&self, frame: ActuatorFrame) {
        self.frames.lock().push(frame);
    }
}

/// An in-process link. Each instance is independent unless it shares a log.
pub struct MockLink {
    address: String,
    log: FrameLog,
    attempts: usize,
    fail_on: Option<usize>,
}

impl MockLink {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            log: FrameLog::default(),
            attempts: 0,
            fail_on: None,
        }
    }

    /// Make the `nth` send (1-based) and every send after it fail with an I/O error.
    pub fn failing_on(mut self, nth: usize) -> Self {
        self.fail_on = Some(nth);
        self
    }

    pub fn log(&self) -> FrameLog {
        self.log.clone()
    }

    /// Number of send calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl ActuatorChannel for MockLink {
    fn open(address: &str, _baud_rate: u32) -> Result<Self> {
        Ok(Self::new(address))
    }

    fn list() -> Result<Vec<PortInfo>> {
        Ok(vec![PortInfo {
            name: "mock0".to_string(),
            driver: "mock".to_string(),
        }])
    }

    fn send(&mut self, frame: &ActuatorFrame) -> Result<()> {
        self.attempts += 1;
        if matches!(self.fail_on, Some(n) if self.attempts >= n) {
            return Err(LinkError::Io(format!(
                "{}: simulated write failure on send {}",
                self.address, self.attempts
            )));
        }
        if !frame.is_valid() {
            return Err(LinkError::InvalidFrame("checksum mismatch"));
        }
        tracing::trace!(address = %self.address, frame = %frame, "mock send");
        self.log.push(*frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_frames_through_shared_log() {
        let mut link = MockLink::open("mock0", 115_200).unwrap();
        let log = link.log();
        link.send(&ActuatorFrame::new(0x02)).unwrap();
        link.send(&ActuatorFrame::new(0x03)).unwrap();
        assert_eq!(
            log.frames(),
            vec![ActuatorFrame::new(0x02), ActuatorFrame::new(0x03)]
        );
        link.close().unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn armed_failure_stops_recording() {
        let mut link = MockLink::new("mock0").failing_on(2);
        let log = link.log();
        assert!(link.send(&ActuatorFrame::new(0x01)).is_ok());
        assert!(matches!(
            link.send(&ActuatorFrame::new(0x01)),
            Err(LinkError::Io(_))
        ));
        assert!(link.send(&ActuatorFrame::new(0x01)).is_err());
        assert_eq!(log.len(), 1);
        assert_eq!(link.attempts(), 3);
    }

    #[test]
    fn lists_a_single_mock_port() {
        let ports = MockLink::list().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].driver, "mock");
    }
}
