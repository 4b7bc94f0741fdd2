//! Turns recognized utterances into actuator frames

use crate::classifier::IntentClassifier;
use crate::embedding::EmbeddingError;
use crate::metrics::DispatchMetrics;
use crate::steps::extract_steps;
use crate::Command;
use serial_link::{ActuatorChannel, ActuatorFrame, LinkError};
use thiserror::Error;
use tracing::{info, warn};

/// Upper bound on repeats for a single utterance.
pub const DEFAULT_MAX_STEPS: u32 = 20;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("classification failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("actuator link failed after {sent} of {requested} frames: {source}")]
    Actuator {
        sent: u32,
        requested: u32,
        #[source]
        source: LinkError,
    },
}

/// Everything the dispatcher decided about one utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recognition {
    pub command: Option<Command>,
    pub code: Option<u8>,
    pub score: f32,
    pub steps: u32,
}

/// Object-safe view of a dispatcher, for callers that do not care which
/// link it drives.
pub trait CommandExecutor: Send {
    fn execute(&mut self, utterance: &str) -> Result<bool, DispatchError>;
}

pub struct CommandDispatcher<C: ActuatorChannel> {
    classifier: IntentClassifier,
    channel: C,
    max_steps: u32,
    metrics: Option<DispatchMetrics>,
}

impl<C: ActuatorChannel> CommandDispatcher<C> {
    pub fn new(classifier: IntentClassifier, channel: C) -> Self {
        Self {
            classifier,
            channel,
            max_steps: DEFAULT_MAX_STEPS,
            metrics: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: DispatchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Step count and classification, without touching the link.
    pub fn recognize(&self, utterance: &str) -> Result<Recognition, EmbeddingError> {
        let steps = extract_steps(utterance);
        let result = self.classifier.classify(utterance)?;
        let code = result
            .command
            .and_then(|c| self.classifier.catalog().code_of(c));
        Ok(Recognition {
            command: result.command,
            code,
            score: result.score,
            steps,
        })
    }

    /// Recognize and, on a match, send the action frame once per step.
    ///
    /// Returns `Ok(false)` when nothing matched; no frame is sent in that
    /// case. A link error aborts the remaining repeats.
    pub fn execute(&mut self, utterance: &str) -> Result<bool, DispatchError> {
        let r = self.recognize(utterance)?;
        let (command, code) = match (r.command, r.code) {
            (Some(command), Some(code)) => (command, code),
            _ => {
                warn!(utterance, score = r.score, "command not understood");
                if let Some(m) = &self.metrics {
                    m.rejected.inc();
                }
                return Ok(false);
            }
        };

        let steps = if r.steps > self.max_steps {
            warn!(requested = r.steps, max = self.max_steps, "step count clamped");
            self.max_steps
        } else {
            r.steps
        };
        info!(
            command = %command,
            code = %format!("0x{code:02X}"),
            score = %format!("{:.2}", r.score),
            steps,
            "executing command"
        );
        if let Some(m) = &self.metrics {
            m.recognized.inc();
        }
        self.send_repeated(code, steps)?;
        Ok(true)
    }

    fn send_repeated(&mut self, code: u8, steps: u32) -> Result<(), DispatchError> {
        let frame = ActuatorFrame::new(code);
        for sent in 0..steps {
            if let Err(source) = self.channel.send(&frame) {
                if let Some(m) = &self.metrics {
                    m.send_failures.inc();
                }
                return Err(DispatchError::Actuator {
                    sent,
                    requested: steps,
                    source,
                });
            }
            if let Some(m) = &self.metrics {
                m.frames_sent.inc();
            }
        }
        Ok(())
    }

    pub fn close(self) -> Result<(), LinkError> {
        self.channel.close()
    }
}

impl<C: ActuatorChannel + Send> CommandExecutor for CommandDispatcher<C> {
    fn execute(&mut self, utterance: &str) -> Result<bool, DispatchError> {
        CommandDispatcher::execute(self, utterance)
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{Catalog, CatalogSpec, EmbeddingProvider, HashingEmbedder};
    use serial_link::MockLink;
    use std::sync::Arc;

    fn classifier() -> IntentClassifier {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::default());
        let catalog = Catalog::build(CatalogSpec::default(), embedder.as_ref()).unwrap();
        IntentClassifier::new(Arc::new(catalog), embedder)
    }

    #[test]
    fn repeats_frame_once_per_step() {
        let link = MockLink::new("mock0");
        let log = link.log();
        let mut d = CommandDispatcher::new(classifier(), link);
        assert!(d.execute("tiến lên 3 bước").unwrap());
        let frames = log.frames();
        assert_eq!(frames.len(), 3);
        for f in frames {
            assert_eq!(f.action(), 0x01);
            assert_eq!(f.checksum_byte(), 0x01 ^ 0xFF);
        }
    }

    #[test]
    fn single_step_by_default() {
        let link = MockLink::new("mock0");
        let log = link.log();
        let mut d = CommandDispatcher::new(classifier(), link);
        assert!(d.execute("dừng lại").unwrap());
        assert_eq!(log.frames(), vec![ActuatorFrame::new(0x05)]);
    }

    #[test]
    fn unrecognized_utterance_sends_nothing() {
        let link = MockLink::new("mock0");
        let log = link.log();
        let metrics = DispatchMetrics::new().unwrap();
        let mut d = CommandDispatcher::new(classifier(), link).with_metrics(metrics.clone());
        assert!(!d.execute("bạn tên là gì").unwrap());
        assert!(log.is_empty());
        assert_eq!(d.channel().attempts(), 0);
        assert_eq!(metrics.rejected.get(), 1);
    }

    #[test]
    fn link_failure_aborts_remaining_repeats() {
        let link = MockLink::new("mock0").failing_on(2);
        let log = link.log();
        let metrics = DispatchMetrics::new().unwrap();
        let mut d = CommandDispatcher::new(classifier(), link).with_metrics(metrics.clone());
        let err = d.execute("lùi lại 3 bước").unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Actuator {
                sent: 1,
                requested: 3,
                ..
            }
        ));
        assert_eq!(log.len(), 1);
        assert_eq!(d.channel().attempts(), 2);
        assert_eq!(metrics.frames_sent.get(), 1);
        assert_eq!(metrics.send_failures.get(), 1);
    }

    #[test]
    fn step_count_is_clamped() {
        let link = MockLink::new("mock0");
        let log = link.log();
        let mut d = CommandDispatcher::new(classifier(), link).with_max_steps(4);
        assert!(d.execute("rẽ phải 50 bước").unwrap());
        assert_eq!(log.len(), 4);
        assert!(log.frames().iter().all(|f| f.action() == 0x04));
    }

    #[test]
    fn recognize_does_not_touch_the_link() {
        let link = MockLink::new("mock0");
        let log = link.log();
        let d = CommandDispatcher::new(classifier(), link);
        let r = d.recognize("quay trái 2 bước").unwrap();
        assert_eq!(r.command, Some(Command::Left));
        assert_eq!(r.code, Some(0x03));
        assert_eq!(r.steps, 2);
        assert!(log.is_empty());
    }

    #[test]
    fn works_through_executor_trait_object() {
        let link = MockLink::new("mock0");
        let log = link.log();
        let mut exec: Box<dyn CommandExecutor> =
            Box::new(CommandDispatcher::new(classifier(), link));
        assert!(exec.execute("sang trái").unwrap());
        assert_eq!(log.len(), 1);
    }
}
