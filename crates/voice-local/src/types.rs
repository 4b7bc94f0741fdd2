use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Mono PCM audio, samples in [-1.0, 1.0].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    pub fn silence(seconds: f32, sample_rate_hz: u32) -> Self {
        let frames = (seconds.max(0.0) * sample_rate_hz as f32) as usize;
        Self::new(vec![0.0; frames], sample_rate_hz)
    }

    pub fn from_i16(pcm: &[i16], sample_rate_hz: u32) -> Self {
        let samples = pcm.iter().map(|&s| s as f32 / 32768.0).collect();
        Self::new(samples, sample_rate_hz)
    }

    pub fn to_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate_hz as f32
    }

    /// Linear-interpolation resample to `sr_out`.
    pub fn resampled(&self, sr_out: u32) -> AudioClip {
        AudioClip::new(
            resample_linear(&self.samples, self.sample_rate_hz, sr_out),
            sr_out,
        )
    }
}

pub(crate) fn resample_linear(samples: &[f32], sr_in: u32, sr_out: u32) -> Vec<f32> {
    if sr_in == sr_out || sr_in == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = sr_out as f64 / sr_in as f64;
    let out_len = (samples.len() as f64 * ratio) as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 / ratio;
        let i0 = (pos.floor() as usize).min(samples.len() - 1);
        let i1 = (i0 + 1).min(samples.len() - 1);
        let t = pos - i0 as f64;
        out.push(samples[i0] * (1.0 - t) as f32 + samples[i1] * t as f32);
    }

    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
        }
    }
}

fn default_sample_rate() -> u32 {
    16000
}

/// Speech-to-text server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    #[serde(default = "default_stt_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_language")]
    pub language: Option<String>,
    #[serde(default = "default_stt_timeout")]
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            endpoint: default_stt_endpoint(),
            language: default_language(),
            timeout_secs: default_stt_timeout(),
        }
    }
}

fn default_stt_endpoint() -> String {
    "http://127.0.0.1:8080/inference".to_string()
}

fn default_language() -> Option<String> {
    Some("vi".to_string())
}

fn default_stt_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_piper_exe")]
    pub executable: PathBuf,
    #[serde(default = "default_voice_model")]
    pub model: PathBuf,
    #[serde(default)]
    pub speaker: Option<u32>,
    /// Used by engines that do not report their own rate.
    #[serde(default = "default_tts_rate")]
    pub sample_rate_hz: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            executable: default_piper_exe(),
            model: default_voice_model(),
            speaker: None,
            sample_rate_hz: default_tts_rate(),
        }
    }
}

fn default_piper_exe() -> PathBuf {
    PathBuf::from("piper")
}

fn default_voice_model() -> PathBuf {
    PathBuf::from("assets/vi_VN-vais1000-medium.onnx")
}

fn default_tts_rate() -> u32 {
    22050
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_requested_duration() {
        let clip = AudioClip::silence(1.5, 16000);
        assert_eq!(clip.samples.len(), 24000);
        assert!((clip.duration_secs() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn i16_conversion_clamps() {
        let clip = AudioClip::new(vec![0.0, 1.0, -1.0, 2.0], 8000);
        assert_eq!(clip.to_i16(), vec![0, 32767, -32767, 32767]);
        let back = AudioClip::from_i16(&[16384], 8000);
        assert!((back.samples[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn resampling_scales_length() {
        let clip = AudioClip::new(vec![0.25; 48000], 48000);
        let down = clip.resampled(16000);
        assert_eq!(down.sample_rate_hz, 16000);
        assert_eq!(down.samples.len(), 16000);
        assert!(down.samples.iter().all(|s| (s - 0.25).abs() < 1e-6));
        assert_eq!(clip.resampled(48000), clip);
    }

    #[test]
    fn configs_fill_defaults_from_empty_json() {
        let stt: SttConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(stt.language.as_deref(), Some("vi"));
        let tts: TtsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(tts.executable, PathBuf::from("piper"));
    }
}
