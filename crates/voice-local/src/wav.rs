use crate::{AudioClip, Result, VoiceError};
use std::io::Cursor;
use std::path::Path;

fn wav_spec(sample_rate_hz: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn wav_err(e: hound::Error) -> VoiceError {
    match e {
        hound::Error::IoError(io) => VoiceError::Io(io),
        other => VoiceError::Wav(other.to_string()),
    }
}

/// 16-bit mono PCM WAV bytes.
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec(clip.sample_rate_hz))
            .map_err(wav_err)?;
        for s in clip.to_i16() {
            writer.write_sample(s).map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;
    }
    Ok(cursor.into_inner())
}

pub fn write_wav(path: &Path, clip: &AudioClip) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(clip.sample_rate_hz))
        .map_err(wav_err)?;
    for s in clip.to_i16() {
        writer.write_sample(s).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)
}

pub fn read_wav(path: &Path) -> Result<AudioClip> {
    let reader = hound::WavReader::open(path).map_err(wav_err)?;
    decode(reader)
}

pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(wav_err)?;
    decode(reader)
}

fn decode<R: std::io::Read>(mut reader: hound::WavReader<R>) -> Result<AudioClip> {
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(wav_err)?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(wav_err)?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    Ok(AudioClip::new(samples, spec.sample_rate))
}

/// Like [`read_wav`], but a missing file yields `None`.
pub fn read_wav_if_exists(path: &Path) -> Result<Option<AudioClip>> {
    if !path.exists() {
        return Ok(None);
    }
    read_wav(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_bytes_decode_to_same_length_and_rate() {
        let clip = AudioClip::new(vec![0.0, 0.5, -0.5, 0.25], 16000);
        let bytes = encode_wav(&clip).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        let back = decode_wav(&bytes).unwrap();
        assert_eq!(back.sample_rate_hz, 16000);
        assert_eq!(back.samples.len(), 4);
        assert!((back.samples[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn stereo_files_are_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..10 {
            w.write_sample(16384_i16).unwrap();
            w.write_sample(0_i16).unwrap();
        }
        w.finalize().unwrap();

        let clip = read_wav(&path).unwrap();
        assert_eq!(clip.samples.len(), 10);
        assert!((clip.samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_wav_if_exists(&dir.path().join("bip.wav"))
            .unwrap()
            .is_none());
    }
}
