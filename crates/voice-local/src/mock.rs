use crate::{AudioClip, AudioSink, Recorder, Result, Transcriber, TtsEngine};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Returns silence of the requested length.
#[derive(Debug, Clone)]
pub struct SilentRecorder {
    sample_rate_hz: u32,
    calls: usize,
}

impl SilentRecorder {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Default for SilentRecorder {
    fn default() -> Self {
        Self::new(16000)
    }
}

impl Recorder for SilentRecorder {
    fn record(&mut self, seconds: f32) -> Result<AudioClip> {
        self.calls += 1;
        Ok(AudioClip::silence(seconds, self.sample_rate_hz))
    }
}

/// Replays a fixed list of transcripts, then returns empty strings.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTranscriber {
    script: VecDeque<String>,
}

impl ScriptedTranscriber {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Transcriber for ScriptedTranscriber {
    fn name(&self) -> &str {
        "scripted"
    }

    fn transcribe(&mut self, _clip: &AudioClip) -> Result<String> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

pub struct MockTts {
    sample_rate_hz: u32,
}

impl MockTts {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz: sample_rate_hz.max(8000),
        }
    }
}

impl Default for MockTts {
    fn default() -> Self {
        Self::new(22050)
    }
}

impl TtsEngine for MockTts {
    fn name(&self) -> &str {
        "mock"
    }

    fn synthesize(&mut self, text: &str) -> Result<AudioClip> {
        // 440 Hz tone whose length follows the text length
        let sr = self.sample_rate_hz;
        let dur_s = (text.chars().count() as f32 / 10.0).clamp(0.2, 1.0);
        let frames = (sr as f32 * dur_s) as usize;
        let freq = 440.0_f32;
        let samples = (0..frames)
            .map(|n| {
                let t = n as f32 / sr as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin() * 0.1
            })
            .collect();
        Ok(AudioClip::new(samples, sr))
    }
}

/// Keeps every clip it is asked to play.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    played: Arc<Mutex<Vec<AudioClip>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<AudioClip> {
        self.played.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.played.lock().len()
    }
}

impl AudioSink for MemorySink {
    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        self.played.lock().push(clip.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_transcriber_drains_then_returns_empty() {
        let mut t = ScriptedTranscriber::new(["bảo ơi", "tiến lên"]);
        let clip = AudioClip::silence(0.1, 16000);
        assert_eq!(t.transcribe(&clip).unwrap(), "bảo ơi");
        assert_eq!(t.transcribe(&clip).unwrap(), "tiến lên");
        assert_eq!(t.transcribe(&clip).unwrap(), "");
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn mock_tts_length_follows_text() {
        let mut tts = MockTts::new(16000);
        let short = tts.synthesize("a").unwrap();
        let long = tts.synthesize(&"a".repeat(50)).unwrap();
        assert_eq!(short.samples.len(), 3200);
        assert_eq!(long.samples.len(), 16000);
        assert!(long.samples.iter().all(|s| s.abs() <= 0.1 + 1e-6));
    }

    #[test]
    fn memory_sink_shares_log_between_clones() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.play(&AudioClip::silence(0.1, 8000)).unwrap();
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.played()[0].samples.len(), 800);
    }

    #[test]
    fn silent_recorder_counts_calls() {
        let mut r = SilentRecorder::default();
        let clip = r.record(2.0).unwrap();
        assert_eq!(clip.samples.len(), 32000);
        assert!(clip.samples.iter().all(|s| *s == 0.0));
        assert_eq!(r.calls(), 1);
    }
}
