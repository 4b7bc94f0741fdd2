use crate::types::resample_linear;
use crate::{AudioClip, Recorder, RecorderConfig, Result, VoiceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Records from the default input device.
///
/// The stream is opened per call so the recorder itself stays `Send`.
pub struct CpalRecorder {
    config: RecorderConfig,
}

impl CpalRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self { config }
    }
}

impl Recorder for CpalRecorder {
    fn record(&mut self, seconds: f32) -> Result<AudioClip> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| VoiceError::Device("no default input device".into()))?;
        let config = device
            .default_input_config()
            .map_err(|e| VoiceError::Device(format!("input config: {e}")))?;
        let device_rate = config.sample_rate().0;
        let channels = config.channels();

        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), channels, tx)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), channels, tx)?,
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), channels, tx)?,
            other => {
                return Err(VoiceError::Device(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        };
        stream
            .play()
            .map_err(|e| VoiceError::Device(format!("stream play: {e}")))?;

        let wanted = (seconds.max(0.0) * device_rate as f32) as usize;
        let deadline = Instant::now() + Duration::from_secs_f32(seconds.max(0.0) + 2.0);
        let mut samples = Vec::with_capacity(wanted);
        while samples.len() < wanted {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                warn!(got = samples.len(), wanted, "input stream stalled");
                break;
            }
            match rx.recv_timeout(left) {
                Ok(chunk) => samples.extend_from_slice(&chunk),
                Err(_) => break,
            }
        }
        drop(stream);
        samples.truncate(wanted);
        debug!(device_rate, channels, frames = samples.len(), "recorded clip");

        let target = self.config.sample_rate_hz;
        Ok(AudioClip::new(
            resample_linear(&samples, device_rate, target),
            target,
        ))
    }
}

trait ToF32: cpal::SizedSample + Send + 'static {
    fn to_f32(self) -> f32;
}

impl ToF32 for i16 {
    fn to_f32(self) -> f32 {
        self as f32 / 32768.0
    }
}

impl ToF32 for u16 {
    fn to_f32(self) -> f32 {
        (self as i32 - 32768) as f32 / 32768.0
    }
}

impl ToF32 for f32 {
    fn to_f32(self) -> f32 {
        self
    }
}

fn build_stream<T: ToF32>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: u16,
    tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream> {
    let ch = usize::from(channels.max(1));
    device
        .build_input_stream(
            config,
            move |data: &[T], _| {
                // downmix
                let mono: Vec<f32> = data
                    .chunks_exact(ch)
                    .map(|frame| frame.iter().map(|s| s.to_f32()).sum::<f32>() / ch as f32)
                    .collect();
                let _ = tx.send(mono);
            },
            |err| warn!(%err, "input stream error"),
            None,
        )
        .map_err(|e| VoiceError::Device(format!("build input stream: {e}")))
}
