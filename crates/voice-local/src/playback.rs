use crate::{AudioClip, AudioSink, Result, VoiceError};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

/// Plays clips on the default output device, blocking until done.
#[derive(Debug, Default)]
pub struct RodioSink;

impl RodioSink {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSink for RodioSink {
    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        if clip.is_empty() {
            return Ok(());
        }
        // OutputStream is not Send; keep it local to the call.
        let (_stream, handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::Device(format!("output stream: {e}")))?;
        let sink =
            Sink::try_new(&handle).map_err(|e| VoiceError::Device(format!("sink: {e}")))?;
        sink.append(SamplesBuffer::new(
            1,
            clip.sample_rate_hz,
            clip.samples.clone(),
        ));
        sink.sleep_until_end();
        Ok(())
    }
}
