use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use conversation::{ConversationMemory, Role, DEFAULT_MAX_HISTORY};
use intent_parser::{
    build_classifier, CommandDispatcher, DispatchMetrics, EmbeddingProvider, HashingEmbedder,
    IntentConfig,
};
use serial_link::{ActuatorChannel, ActuatorFrame, MockLink, DEFAULT_BAUD_RATE};
use voice_local::plugin::{new_tts_engine, TtsKind};
use voice_local::TtsConfig;

#[derive(Parser, Debug)]
#[command(
    name = "bao",
    version,
    about = "Bao assistant bench tool",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Backend {
    Mock,
    Serial,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Embedder {
    /// Bag-of-words hashing; exact wording only, for offline checks
    Hashing,
    Fastembed,
}

impl Default for Embedder {
    fn default() -> Self {
        if cfg!(feature = "fastembed") {
            Embedder::Fastembed
        } else {
            Embedder::Hashing
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Voice {
    Mock,
    Piper,
}

#[derive(clap::Args, Debug)]
struct LinkArgs {
    /// Actuator backend
    #[arg(long, value_enum, default_value_t = Backend::Mock)]
    backend: Backend,
    /// Serial device path (e.g. /dev/ttyUSB0, COM3)
    #[arg(long, default_value = "mock0")]
    port: String,
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,
}

#[derive(clap::Args, Debug)]
struct RecognizerArgs {
    /// Minimum similarity for accepting a command
    #[arg(long)]
    threshold: Option<f32>,
    /// YAML file overriding codes or example phrases
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Sentence embedder; `hashing` skips the model download
    #[arg(long, value_enum, default_value_t = Embedder::default())]
    embedder: Embedder,
    /// Model cache directory for the fastembed embedder
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available actuator ports
    PortList {
        #[arg(long, value_enum, default_value_t = Backend::Mock)]
        backend: Backend,
    },
    /// Encode an action code, or verify a received frame with --decode
    Frame {
        /// Action code (hex like 0x04 or decimal)
        code: Option<String>,
        /// Two hex bytes to verify, e.g. "04 FB"
        #[arg(long, num_args = 2)]
        decode: Option<Vec<String>>,
    },
    /// Send a raw action code
    Send {
        #[command(flatten)]
        link: LinkArgs,
        /// Action code (hex like 0x04 or decimal)
        code: String,
        /// Number of frames to send
        #[arg(long, default_value_t = 1u32)]
        repeat: u32,
    },
    /// Classify an utterance without touching the actuator
    Classify {
        #[command(flatten)]
        recognizer: RecognizerArgs,
        text: String,
    },
    /// Recognize an utterance and send its frames
    Execute {
        #[command(flatten)]
        recognizer: RecognizerArgs,
        #[command(flatten)]
        link: LinkArgs,
        #[arg(long, default_value_t = intent_parser::DEFAULT_MAX_STEPS)]
        max_steps: u32,
        /// Print dispatch counters afterwards
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
        text: String,
    },
    /// Print recent conversation turns
    MemoryShow {
        #[arg(long, default_value = "conversation_memory.json")]
        file: PathBuf,
        #[arg(long, default_value_t = 10usize)]
        limit: usize,
    },
    /// Message counts of a memory file
    MemoryStats {
        #[arg(long, default_value = "conversation_memory.json")]
        file: PathBuf,
        /// Print JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Erase the conversation history
    MemoryClear {
        #[arg(long, default_value = "conversation_memory.json")]
        file: PathBuf,
    },
    /// Synthesize text to a WAV file
    Say {
        text: String,
        #[arg(long, default_value = "answer.wav")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Voice::Piper)]
        voice: Voice,
        /// Voice model for piper
        #[arg(long)]
        model: Option<PathBuf>,
        /// piper executable
        #[arg(long)]
        piper: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::PortList { backend } => port_list(backend),
        Commands::Frame { code, decode } => frame(code.as_deref(), decode.as_deref()),
        Commands::Send { link, code, repeat } => send(&link, &code, repeat),
        Commands::Classify { recognizer, text } => classify(&recognizer, &text),
        Commands::Execute {
            recognizer,
            link,
            max_steps,
            metrics,
            text,
        } => execute(&recognizer, &link, max_steps, metrics, &text),
        Commands::MemoryShow { file, limit } => memory_show(&file, limit),
        Commands::MemoryStats { file, json } => memory_stats(&file, json),
        Commands::MemoryClear { file } => memory_clear(&file),
        Commands::Say {
            text,
            out,
            voice,
            model,
            piper,
        } => say(&text, &out, voice, model, piper),
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn port_list(backend: Backend) -> Result<()> {
    let ports = match backend {
        Backend::Mock => MockLink::list()?,
        Backend::Serial => serial_list()?,
    };
    for p in ports {
        println!("{}\t{}", p.name, p.driver);
    }
    Ok(())
}

#[cfg(feature = "serial")]
fn serial_list() -> Result<Vec<serial_link::PortInfo>> {
    Ok(serial_link::SerialLink::list()?)
}

#[cfg(not(feature = "serial"))]
fn serial_list() -> Result<Vec<serial_link::PortInfo>> {
    anyhow::bail!("built without the serial feature")
}

fn parse_code(s: &str) -> Result<u8> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => t.parse::<u8>(),
    };
    parsed.map_err(|e| anyhow::anyhow!("invalid action code '{t}': {e}"))
}

fn parse_hex_byte(s: &str) -> Result<u8> {
    let t = s.trim();
    let no_prefix = t.strip_prefix("0x").unwrap_or(t);
    u8::from_str_radix(no_prefix, 16).map_err(|e| anyhow::anyhow!("invalid hex byte '{t}': {e}"))
}

fn frame(code: Option<&str>, decode: Option<&[String]>) -> Result<()> {
    if let Some(bytes) = decode {
        let raw = [parse_hex_byte(&bytes[0])?, parse_hex_byte(&bytes[1])?];
        let f = ActuatorFrame::from_bytes(raw)?;
        println!("ok: action=0x{:02X} checksum=0x{:02X}", f.action(), f.checksum_byte());
        return Ok(());
    }
    let code = code.context("give an action code or --decode BYTE BYTE")?;
    let f = ActuatorFrame::new(parse_code(code)?);
    println!("{f}");
    Ok(())
}

fn send_with<C: ActuatorChannel>(mut link: C, frame: &ActuatorFrame, repeat: u32) -> Result<()> {
    for i in 0..repeat {
        link.send(frame)
            .with_context(|| format!("send {} of {repeat} failed", i + 1))?;
    }
    link.close()?;
    Ok(())
}

fn send(link: &LinkArgs, code: &str, repeat: u32) -> Result<()> {
    let f = ActuatorFrame::new(parse_code(code)?);
    match link.backend {
        Backend::Mock => send_with(MockLink::open(&link.port, link.baud)?, &f, repeat)?,
        Backend::Serial => {
            #[cfg(feature = "serial")]
            send_with(
                serial_link::SerialLink::open(&link.port, link.baud)?,
                &f,
                repeat,
            )?;
            #[cfg(not(feature = "serial"))]
            anyhow::bail!("built without the serial feature");
        }
    }
    info!(port = %link.port, frame = %f, repeat, "sent");
    println!("sent {f} x{repeat}");
    Ok(())
}

fn embedder(args: &RecognizerArgs) -> Result<Arc<dyn EmbeddingProvider>> {
    match args.embedder {
        Embedder::Hashing => Ok(Arc::new(HashingEmbedder::default())),
        Embedder::Fastembed => {
            #[cfg(feature = "fastembed")]
            {
                let e = intent_parser::FastEmbedder::new(args.cache_dir.clone())
                    .context("loading embedding model")?;
                Ok(Arc::new(e))
            }
            #[cfg(not(feature = "fastembed"))]
            {
                anyhow::bail!("built without the fastembed feature")
            }
        }
    }
}

fn intent_config(args: &RecognizerArgs, max_steps: u32) -> IntentConfig {
    let mut cfg = IntentConfig {
        max_steps,
        catalog_file: args.catalog.clone(),
        ..IntentConfig::default()
    };
    if let Some(t) = args.threshold {
        cfg.confidence_threshold = t;
    }
    cfg
}

fn classify(args: &RecognizerArgs, text: &str) -> Result<()> {
    let cfg = intent_config(args, intent_parser::DEFAULT_MAX_STEPS);
    let classifier = build_classifier(&cfg, embedder(args)?)?;
    let steps = intent_parser::extract_steps(text);
    let result = classifier.classify(text)?;
    match result.command {
        Some(cmd) => {
            let code = classifier.catalog().code_of(cmd).unwrap_or_default();
            println!(
                "{cmd}\tcode=0x{code:02X}\tscore={:.3}\tsteps={steps}",
                result.score
            );
        }
        None => println!(
            "no match\tscore={:.3}\tthreshold={:.2}",
            result.score,
            classifier.threshold()
        ),
    }
    Ok(())
}

fn execute(
    args: &RecognizerArgs,
    link: &LinkArgs,
    max_steps: u32,
    show_metrics: bool,
    text: &str,
) -> Result<()> {
    let cfg = intent_config(args, max_steps);
    let classifier = build_classifier(&cfg, embedder(args)?)?;
    let metrics = DispatchMetrics::new().map_err(anyhow::Error::msg)?;

    let matched = match link.backend {
        Backend::Mock => {
            let mock = MockLink::open(&link.port, link.baud)?;
            let log = mock.log();
            let mut d = CommandDispatcher::new(classifier, mock)
                .with_max_steps(max_steps)
                .with_metrics(metrics.clone());
            let matched = d.execute(text)?;
            for f in log.frames() {
                println!("frame {f}");
            }
            matched
        }
        Backend::Serial => {
            #[cfg(feature = "serial")]
            {
                let serial = serial_link::SerialLink::open(&link.port, link.baud)?;
                let mut d = CommandDispatcher::new(classifier, serial)
                    .with_max_steps(max_steps)
                    .with_metrics(metrics.clone());
                let matched = d.execute(text)?;
                d.close()?;
                matched
            }
            #[cfg(not(feature = "serial"))]
            {
                let _ = classifier;
                anyhow::bail!("built without the serial feature")
            }
        }
    };

    println!("{}", if matched { "executed" } else { "not understood" });
    if show_metrics {
        print!("{}", metrics.encode_text());
    }
    Ok(())
}

fn memory_show(file: &Path, limit: usize) -> Result<()> {
    let memory = ConversationMemory::open(file, DEFAULT_MAX_HISTORY.max(limit));
    if memory.is_empty() {
        println!("(no history in {})", file.display());
        return Ok(());
    }
    for m in memory.recent(limit) {
        let who = match m.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        // YYYY-MM-DDTHH:MM:SS
        let ts: String = m.timestamp.chars().take(19).collect();
        let preview: String = m.content.chars().take(100).collect();
        let more = if m.content.chars().count() > 100 { "..." } else { "" };
        println!("{who} [{ts}]: {preview}{more}");
    }
    Ok(())
}

fn memory_stats(file: &Path, json: bool) -> Result<()> {
    let memory = ConversationMemory::open(file, usize::MAX);
    let stats = memory.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("file: {}", stats.memory_file.display());
        println!("total: {}", stats.total_messages);
        println!("user: {}", stats.user_messages);
        println!("assistant: {}", stats.assistant_messages);
    }
    Ok(())
}

fn memory_clear(file: &Path) -> Result<()> {
    let mut memory = ConversationMemory::open(file, DEFAULT_MAX_HISTORY);
    memory.clear()?;
    println!("cleared {}", file.display());
    Ok(())
}

fn say(
    text: &str,
    out: &Path,
    voice: Voice,
    model: Option<PathBuf>,
    piper: Option<PathBuf>,
) -> Result<()> {
    let mut cfg = TtsConfig::default();
    if let Some(model) = model {
        cfg.model = model;
    }
    if let Some(exe) = piper {
        cfg.executable = exe;
    }
    let kind = match voice {
        Voice::Mock => TtsKind::Mock,
        Voice::Piper => TtsKind::Piper,
    };
    let mut tts = new_tts_engine(kind, cfg).map_err(anyhow::Error::msg)?;
    let clip = tts.synthesize(text)?;
    voice_local::wav::write_wav(out, &clip)?;
    println!(
        "wrote {} ({:.2}s at {} Hz)",
        out.display(),
        clip.duration_secs(),
        clip.sample_rate_hz
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_codes() {
        assert_eq!(parse_code("0x04").unwrap(), 4);
        assert_eq!(parse_code("0XfF").unwrap(), 255);
        assert_eq!(parse_code("5").unwrap(), 5);
        assert!(parse_code("0x100").is_err());
        assert!(parse_code("abc").is_err());
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        assert!(frame(None, Some(&["04".to_string(), "FB".to_string()])).is_ok());
        assert!(frame(None, Some(&["04".to_string(), "FA".to_string()])).is_err());
        assert!(frame(None, None).is_err());
    }

    #[test]
    fn send_stops_at_first_failure() {
        let link = MockLink::new("mock0").failing_on(3);
        let log = link.log();
        let f = ActuatorFrame::new(0x02);
        assert!(send_with(link, &f, 5).is_err());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn embedder_defaults_to_the_model_when_built_in() {
        let cli = Cli::try_parse_from(["bao", "classify", "tiến lên"]).unwrap();
        let Commands::Classify { recognizer, .. } = cli.command else {
            unreachable!("parsed a different subcommand");
        };
        let expected = if cfg!(feature = "fastembed") {
            Embedder::Fastembed
        } else {
            Embedder::Hashing
        };
        assert_eq!(recognizer.embedder, expected);

        let cli =
            Cli::try_parse_from(["bao", "classify", "--embedder", "hashing", "tiến lên"]).unwrap();
        let Commands::Classify { recognizer, .. } = cli.command else {
            unreachable!("parsed a different subcommand");
        };
        assert_eq!(recognizer.embedder, Embedder::Hashing);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
