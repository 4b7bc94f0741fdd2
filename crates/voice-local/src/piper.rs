use crate::wav::read_wav;
use crate::{AudioClip, Result, TtsConfig, TtsEngine, VoiceError};
use std::io::Write;
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

/// Runs the `piper` executable; text goes in on stdin, audio comes back as
/// a temporary WAV file.
pub struct PiperTts {
    config: TtsConfig,
}

impl PiperTts {
    pub fn new(config: TtsConfig) -> Self {
        Self { config }
    }

    fn command(&self, output: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.config.executable);
        cmd.arg("--model")
            .arg(&self.config.model)
            .arg("--output_file")
            .arg(output);
        if let Some(speaker) = self.config.speaker {
            cmd.arg("--speaker").arg(speaker.to_string());
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

/// Write `text` to the child's stdin and close it. On a write failure the
/// child is killed and reaped before the error is returned.
fn feed_stdin(child: &mut Child, text: &str) -> Result<()> {
    let Some(mut stdin) = child.stdin.take() else {
        return Ok(());
    };
    let written = stdin
        .write_all(text.as_bytes())
        .and_then(|()| stdin.write_all(b"\n"));
    drop(stdin);
    if let Err(e) = written {
        warn!(error = %e, "piper stopped reading its input");
        let _ = child.kill();
        let _ = child.wait();
        return Err(e.into());
    }
    Ok(())
}

impl TtsEngine for PiperTts {
    fn name(&self) -> &str {
        "piper"
    }

    fn synthesize(&mut self, text: &str) -> Result<AudioClip> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(AudioClip::new(Vec::new(), self.config.sample_rate_hz));
        }
        let out = tempfile::Builder::new().suffix(".wav").tempfile()?;

        let mut child = self.command(out.path()).spawn().map_err(|e| {
            VoiceError::Backend(format!(
                "cannot start {}: {e}",
                self.config.executable.display()
            ))
        })?;
        feed_stdin(&mut child, text)?;
        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Backend(format!(
                "piper exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let clip = read_wav(out.path())?;
        debug!(secs = clip.duration_secs(), "synthesized reply");
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_text_skips_the_process() {
        let mut tts = PiperTts::new(TtsConfig {
            executable: PathBuf::from("/nonexistent/piper"),
            ..TtsConfig::default()
        });
        assert!(tts.synthesize("   ").unwrap().is_empty());
    }

    #[test]
    fn missing_executable_is_backend_error() {
        let mut tts = PiperTts::new(TtsConfig {
            executable: PathBuf::from("/nonexistent/piper"),
            ..TtsConfig::default()
        });
        assert!(matches!(
            tts.synthesize("xin chào"),
            Err(VoiceError::Backend(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn child_is_reaped_when_it_stops_reading() {
        let mut child = Command::new("true")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        // larger than any pipe buffer, so the write fails once `true` exits
        let text = "a".repeat(4 << 20);
        assert!(matches!(feed_stdin(&mut child, &text), Err(VoiceError::Io(_))));
        assert!(child.try_wait().unwrap().is_some());
    }
}
