use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct DispatchMetrics {
    pub registry: Registry,
    pub recognized: IntCounter,
    pub rejected: IntCounter,
    pub frames_sent: IntCounter,
    pub send_failures: IntCounter,
}

impl DispatchMetrics {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| {
            IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))
        };
        let recognized = counter("bao_commands_recognized", "Utterances mapped to a command")?;
        let rejected = counter(
            "bao_commands_rejected",
            "Utterances below the confidence threshold",
        )?;
        let frames_sent = counter("bao_actuator_frames_sent", "Actuator frames written")?;
        let send_failures = counter(
            "bao_actuator_send_failures",
            "Dispatches aborted by a link error",
        )?;
        let _ = registry.register(Box::new(recognized.clone()));
        let _ = registry.register(Box::new(rejected.clone()));
        let _ = registry.register(Box::new(frames_sent.clone()));
        let _ = registry.register(Box::new(send_failures.clone()));
        Ok(Self {
            registry,
            recognized,
            rejected,
            frames_sent,
            send_failures,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_counters_as_text() {
        let m = DispatchMetrics::new().unwrap();
        m.frames_sent.inc_by(3);
        m.rejected.inc();
        let text = m.encode_text();
        assert!(text.contains("bao_actuator_frames_sent 3"));
        assert!(text.contains("bao_commands_rejected 1"));
        assert!(text.contains("bao_commands_recognized 0"));
    }
}
