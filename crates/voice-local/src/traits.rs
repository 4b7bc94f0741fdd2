use crate::{AudioClip, Result};

/// Captures a fixed-length clip from an input device.
pub trait Recorder: Send {
    fn record(&mut self, seconds: f32) -> Result<AudioClip>;
}

/// Speech to text. An empty string means nothing intelligible was heard.
pub trait Transcriber: Send {
    fn name(&self) -> &str;
    fn transcribe(&mut self, clip: &AudioClip) -> Result<String>;
}

pub trait TtsEngine: Send {
    fn name(&self) -> &str;
    fn synthesize(&mut self, text: &str) -> Result<AudioClip>;
}

/// Blocking playback; returns once the clip has been played.
pub trait AudioSink: Send {
    fn play(&mut self, clip: &AudioClip) -> Result<()>;
}
