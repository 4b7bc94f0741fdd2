mod config;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use config::{load_config, AssistantConfig, EmbedderKind, LinkBackend};
use conversation::{ChatModel, ConversationMemory, Responder};
use intent_parser::{
    build_classifier, CommandDispatcher, CommandExecutor, DispatchMetrics, EmbeddingProvider,
    HashingEmbedder,
};
use pipeline::{Assistant, Beeps, Timing, Turn};
use serial_link::{ActuatorChannel, MockLink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use voice_local::plugin::{new_transcriber, new_tts_engine};
use voice_local::{AudioClip, AudioSink, Recorder, TtsEngine, WakeWordDetector};

#[derive(Parser, Debug)]
#[command(name = "bao-daemon", version)]
#[command(about = "Bao voice assistant: robot commands or spoken chat replies")]
struct Args {
    /// YAML configuration file; built-in defaults when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Serial port of the motion controller
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Actuator backend
    #[arg(long, value_enum)]
    link: Option<LinkBackend>,

    /// Minimum similarity for accepting a command
    #[arg(long)]
    threshold: Option<f32>,

    /// Send every utterance to the chat model
    #[arg(long)]
    no_actuator: bool,

    /// Read utterances from stdin instead of listening for the wake word
    #[arg(long)]
    text: bool,
}

impl Args {
    fn apply(&self, cfg: &mut AssistantConfig) {
        if let Some(port) = &self.port {
            cfg.actuator.port = port.clone();
        }
        if let Some(baud) = self.baud {
            cfg.actuator.baud_rate = baud;
        }
        if let Some(link) = self.link {
            cfg.actuator.backend = link;
        }
        if let Some(threshold) = self.threshold {
            cfg.intent.confidence_threshold = threshold;
        }
        if self.no_actuator {
            cfg.actuator.enabled = false;
        }
    }
}

/// Drops audio; used when the build has no output device support.
#[cfg(not(feature = "audio"))]
struct DiscardSink;

#[cfg(not(feature = "audio"))]
impl AudioSink for DiscardSink {
    fn play(&mut self, _clip: &AudioClip) -> voice_local::Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => AssistantConfig::default(),
    };
    args.apply(&mut cfg);
    cfg.validate().context("invalid command-line override")?;

    info!(
        wake = %cfg.wake.phrase,
        actuator = cfg.actuator.enabled,
        port = %cfg.actuator.port,
        model = %cfg.llm.model,
        text_mode = args.text,
        "bao-daemon starting"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);
    let text_mode = args.text;
    let mut worker = tokio::task::spawn_blocking(move || -> Result<()> {
        let (mut assistant, metrics) = build_assistant(&cfg, text_mode)?;
        info!("assistant ready");
        if text_mode {
            let stdin = std::io::stdin();
            pipeline::run_text(
                &mut assistant,
                stdin.lock(),
                &mut std::io::stdout(),
                &worker_stop,
            )
            .context("reading stdin")?;
        } else {
            run_voice(&mut assistant, &worker_stop);
        }
        if let Some(m) = metrics {
            debug!(metrics = %m.encode_text(), "dispatch counters");
        }
        Ok(())
    });

    tokio::select! {
        res = &mut worker => {
            res.context("assistant task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            stop.store(true, Ordering::SeqCst);
            // A cycle may be blocked on the microphone or stdin.
            match tokio::time::timeout(Duration::from_secs(10), &mut worker).await {
                Ok(res) => res.context("assistant task panicked")??,
                Err(_) => {
                    warn!("assistant did not stop in time, exiting");
                    std::process::exit(0);
                }
            }
        }
    }

    info!("bao-daemon stopped");
    Ok(())
}

fn run_voice(assistant: &mut Assistant, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match assistant.run_cycle() {
            Ok(Turn::Idle) => {}
            Ok(turn) => debug!(?turn, "cycle finished"),
            Err(e) => {
                error!(error = %format!("{e:#}"), "cycle failed");
                // avoid spinning on a broken device
                std::thread::sleep(Duration::from_millis(500));
            }
        }
    }
}

fn build_assistant(
    cfg: &AssistantConfig,
    text_mode: bool,
) -> Result<(Assistant, Option<DispatchMetrics>)> {
    let (executor, metrics) = if cfg.actuator.enabled {
        let metrics = DispatchMetrics::new().map_err(anyhow::Error::msg)?;
        let executor = build_executor(cfg, metrics.clone())?;
        (Some(executor), Some(metrics))
    } else {
        info!("actuator disabled, chat only");
        (None, None)
    };

    let recorder = build_recorder(cfg, text_mode)?;
    let (tts, sink) = build_output(cfg, text_mode)?;
    let transcriber =
        new_transcriber(cfg.stt.backend, cfg.stt.server.clone()).map_err(anyhow::Error::msg)?;

    let memory = ConversationMemory::open(&cfg.memory.file, cfg.memory.max_history);
    let responder = Responder::new(build_chat_model(cfg)?, memory, &cfg.persona)
        .with_max_reply_chars(cfg.reply.max_chars);

    let beeps = Beeps {
        start: load_beep(&cfg.audio.beep_start),
        stop: load_beep(&cfg.audio.beep_stop),
    };

    let assistant = Assistant {
        wake: WakeWordDetector::new(&cfg.wake.phrase),
        recorder,
        transcriber,
        tts,
        sink,
        executor,
        responder,
        beeps,
        timing: Timing {
            wake_seconds: cfg.wake.listen_seconds,
            record_seconds: cfg.audio.record_seconds,
        },
    };
    Ok((assistant, metrics))
}

fn build_embedder(cfg: &AssistantConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match cfg.embedder.backend {
        EmbedderKind::Hashing => {
            warn!("hashing embedder selected; only near-exact phrasings will match");
            Ok(Arc::new(HashingEmbedder::default()))
        }
        EmbedderKind::Fastembed => {
            #[cfg(feature = "fastembed")]
            {
                let e = intent_parser::FastEmbedder::new(cfg.embedder.cache_dir.clone())
                    .context("loading embedding model")?;
                Ok(Arc::new(e))
            }
            #[cfg(not(feature = "fastembed"))]
            {
                anyhow::bail!("embedder 'fastembed' requested but built without the fastembed feature")
            }
        }
    }
}

fn build_executor(cfg: &AssistantConfig, metrics: DispatchMetrics) -> Result<Box<dyn CommandExecutor>> {
    let classifier = build_classifier(&cfg.intent, build_embedder(cfg)?)?;
    info!(
        commands = classifier.catalog().len(),
        model = classifier.catalog().model(),
        threshold = classifier.threshold(),
        "command catalog ready"
    );
    let port = cfg.actuator.port.as_str();
    let baud = cfg.actuator.baud_rate;
    let max_steps = cfg.intent.max_steps;
    match cfg.actuator.backend {
        LinkBackend::Mock => {
            let link = MockLink::open(port, baud)?;
            Ok(Box::new(
                CommandDispatcher::new(classifier, link)
                    .with_max_steps(max_steps)
                    .with_metrics(metrics),
            ))
        }
        LinkBackend::Serial => {
            #[cfg(feature = "serial")]
            {
                let link = serial_link::SerialLink::open(port, baud)
                    .with_context(|| format!("opening actuator port {port}"))?;
                Ok(Box::new(
                    CommandDispatcher::new(classifier, link)
                        .with_max_steps(max_steps)
                        .with_metrics(metrics),
                ))
            }
            #[cfg(not(feature = "serial"))]
            {
                let _ = (classifier, metrics, max_steps);
                anyhow::bail!("serial actuator requested but built without the serial feature")
            }
        }
    }
}

fn build_recorder(cfg: &AssistantConfig, text_mode: bool) -> Result<Box<dyn Recorder>> {
    if text_mode {
        return Ok(Box::new(voice_local::SilentRecorder::new(
            cfg.audio.sample_rate_hz,
        )));
    }
    #[cfg(feature = "audio")]
    {
        Ok(Box::new(voice_local::CpalRecorder::new(
            voice_local::RecorderConfig {
                sample_rate_hz: cfg.audio.sample_rate_hz,
            },
        )))
    }
    #[cfg(not(feature = "audio"))]
    {
        anyhow::bail!("voice mode needs the audio feature; run with --text")
    }
}

fn build_output(
    cfg: &AssistantConfig,
    text_mode: bool,
) -> Result<(Box<dyn TtsEngine>, Box<dyn AudioSink>)> {
    #[cfg(feature = "audio")]
    {
        let _ = text_mode;
        let tts =
            new_tts_engine(cfg.tts.backend, cfg.tts.engine.clone()).map_err(anyhow::Error::msg)?;
        Ok((tts, Box::new(voice_local::RodioSink::new())))
    }
    #[cfg(not(feature = "audio"))]
    {
        if !text_mode {
            anyhow::bail!("voice mode needs the audio feature; run with --text");
        }
        // Replies are printed; synthesis would have nowhere to go.
        let tts = new_tts_engine(voice_local::plugin::TtsKind::Mock, cfg.tts.engine.clone())
            .map_err(anyhow::Error::msg)?;
        Ok((tts, Box::new(DiscardSink)))
    }
}

fn build_chat_model(cfg: &AssistantConfig) -> Result<Box<dyn ChatModel>> {
    #[cfg(feature = "ollama")]
    {
        let client = conversation::OllamaClient::new(cfg.llm.clone())?;
        Ok(Box::new(client))
    }
    #[cfg(not(feature = "ollama"))]
    {
        let _ = cfg;
        anyhow::bail!("chat replies need the ollama feature")
    }
}

fn load_beep(path: &Path) -> Option<AudioClip> {
    match voice_local::wav::read_wav_if_exists(path) {
        Ok(clip) => clip,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read beep file");
            None
        }
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
