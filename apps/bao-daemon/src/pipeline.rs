//! One listen → transcribe → route → respond cycle of the assistant.

use anyhow::Context;
use conversation::{sanitize_user_input, Responder};
use intent_parser::CommandExecutor;
use std::io::{BufRead, ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use voice_local::{AudioClip, AudioSink, Recorder, Transcriber, TtsEngine, WakeWordDetector};

/// What a cycle ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Wake phrase not heard.
    Idle,
    /// Woken, but nothing intelligible was said.
    NoSpeech,
    /// Utterance was a robot command and was executed.
    Command,
    /// Utterance went to the chat model; the (possibly empty) reply.
    Reply(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub wake_seconds: f32,
    pub record_seconds: f32,
}

/// Start/stop cues around the recording window. Missing files are `None`.
#[derive(Debug, Clone, Default)]
pub struct Beeps {
    pub start: Option<AudioClip>,
    pub stop: Option<AudioClip>,
}

pub struct Assistant {
    pub(crate) wake: WakeWordDetector,
    pub(crate) recorder: Box<dyn Recorder>,
    pub(crate) transcriber: Box<dyn Transcriber>,
    pub(crate) tts: Box<dyn TtsEngine>,
    pub(crate) sink: Box<dyn AudioSink>,
    pub(crate) executor: Option<Box<dyn CommandExecutor>>,
    pub(crate) responder: Responder,
    pub(crate) beeps: Beeps,
    pub(crate) timing: Timing,
}

impl Assistant {
    fn transcribe(&mut self, clip: &AudioClip) -> anyhow::Result<String> {
        let raw = self
            .transcriber
            .transcribe(clip)
            .with_context(|| format!("transcription via {}", self.transcriber.name()))?;
        Ok(sanitize_user_input(&raw))
    }

    fn cue(&mut self, clip: Option<AudioClip>) {
        if let Some(clip) = clip {
            if let Err(e) = self.sink.play(&clip) {
                warn!(error = %e, "cannot play cue");
            }
        }
    }

    /// Record one short window and check it for the wake phrase.
    pub fn listen_for_wake(&mut self) -> anyhow::Result<bool> {
        let clip = self
            .recorder
            .record(self.timing.wake_seconds)
            .context("recording wake window")?;
        let heard = self.transcribe(&clip)?;
        if heard.is_empty() {
            return Ok(false);
        }
        debug!(heard = %heard, "wake window");
        Ok(self.wake.detect(&heard))
    }

    /// Beep, record the request, beep again, and transcribe it.
    pub fn capture_utterance(&mut self) -> anyhow::Result<String> {
        self.cue(self.beeps.start.clone());
        let clip = self
            .recorder
            .record(self.timing.record_seconds)
            .context("recording request")?;
        self.cue(self.beeps.stop.clone());
        self.transcribe(&clip)
    }

    /// Route a transcript: robot command if the dispatcher recognizes it,
    /// otherwise a spoken chat reply.
    pub fn handle_utterance(&mut self, text: &str) -> anyhow::Result<Turn> {
        let text = sanitize_user_input(text);
        if text.is_empty() {
            return Ok(Turn::NoSpeech);
        }
        info!(user = %text, "utterance");

        if let Some(executor) = self.executor.as_mut() {
            if executor.execute(&text).context("dispatching command")? {
                return Ok(Turn::Command);
            }
        }

        let reply = self.responder.respond(&text).context("asking chat model")?;
        if !reply.is_empty() {
            info!(assistant = %reply, "reply");
            self.speak(&reply)?;
        }
        Ok(Turn::Reply(reply))
    }

    pub fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        let clip = self
            .tts
            .synthesize(text)
            .with_context(|| format!("speech synthesis via {}", self.tts.name()))?;
        self.sink.play(&clip).context("playing reply")?;
        Ok(())
    }

    /// A full voice cycle. Errors are per cycle; the caller logs and goes on.
    pub fn run_cycle(&mut self) -> anyhow::Result<Turn> {
        if !self.listen_for_wake()? {
            return Ok(Turn::Idle);
        }
        info!(phrase = self.wake.phrase(), "wake word detected");
        let text = self.capture_utterance()?;
        if text.is_empty() {
            return Ok(Turn::NoSpeech);
        }
        self.handle_utterance(&text)
    }
}

/// Feed each input line to the assistant until EOF or `stop` is set.
///
/// A line that is not valid UTF-8 is skipped; any other read error ends the
/// loop. Per-utterance failures are logged and the next line is read.
pub fn run_text(
    assistant: &mut Assistant,
    input: impl BufRead,
    out: &mut impl Write,
    stop: &AtomicBool,
) -> anyhow::Result<()> {
    for line in input.lines() {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!(error = %e, "skipping undecodable input line");
                continue;
            }
            Err(e) => return Err(e).context("reading input"),
        };
        match assistant.handle_utterance(&line) {
            Ok(Turn::Command) => writeln!(out, "(command executed)")?,
            Ok(Turn::Reply(reply)) if !reply.is_empty() => writeln!(out, "{reply}")?,
            Ok(_) => {}
            Err(e) => error!(error = %format!("{e:#}"), "utterance failed"),
        }
    }
    Ok(())
}
