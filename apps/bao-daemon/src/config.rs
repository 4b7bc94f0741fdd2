use anyhow::Context;
use conversation::{OllamaConfig, Persona, DEFAULT_MAX_HISTORY, DEFAULT_MAX_REPLY_CHARS};
use intent_parser::IntentConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use voice_local::plugin::{TranscriberKind, TtsKind};
use voice_local::{SttConfig, TtsConfig};

/// Everything the daemon reads from its YAML file. Every field has a
/// default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssistantConfig {
    pub wake: WakeConfig,
    pub audio: AudioConfig,
    pub stt: SpeechToTextConfig,
    pub tts: TextToSpeechConfig,
    pub llm: OllamaConfig,
    pub memory: MemoryConfig,
    pub reply: ReplyConfig,
    pub persona: Persona,
    pub actuator: ActuatorConfig,
    pub intent: IntentConfig,
    pub embedder: EmbedderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    pub phrase: String,
    /// Length of each wake-word listening window.
    pub listen_seconds: f32,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            phrase: "Bảo ơi".to_string(),
            listen_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate_hz: u32,
    pub record_seconds: f32,
    pub beep_start: PathBuf,
    pub beep_stop: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16000,
            record_seconds: 6.0,
            beep_start: PathBuf::from("assets/bip.wav"),
            beep_stop: PathBuf::from("assets/bip2.wav"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechToTextConfig {
    #[serde(default = "default_stt_backend")]
    pub backend: TranscriberKind,
    #[serde(flatten)]
    pub server: SttConfig,
}

impl Default for SpeechToTextConfig {
    fn default() -> Self {
        Self {
            backend: default_stt_backend(),
            server: SttConfig::default(),
        }
    }
}

fn default_stt_backend() -> TranscriberKind {
    TranscriberKind::WhisperHttp
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToSpeechConfig {
    #[serde(default = "default_tts_backend")]
    pub backend: TtsKind,
    #[serde(flatten)]
    pub engine: TtsConfig,
}

impl Default for TextToSpeechConfig {
    fn default() -> Self {
        Self {
            backend: default_tts_backend(),
            engine: TtsConfig::default(),
        }
    }
}

fn default_tts_backend() -> TtsKind {
    TtsKind::Piper
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub file: PathBuf,
    pub max_history: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("conversation_memory.json"),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    pub max_chars: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_REPLY_CHARS,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LinkBackend {
    Mock,
    Serial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Without an actuator every utterance goes to the chat model.
    pub enabled: bool,
    pub backend: LinkBackend,
    pub port: String,
    pub baud_rate: u32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: LinkBackend::Serial,
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: serial_link::DEFAULT_BAUD_RATE,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Bag-of-words hashing; exact wording only, no model download.
    Hashing,
    Fastembed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub backend: EmbedderKind,
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            backend: if cfg!(feature = "fastembed") {
                EmbedderKind::Fastembed
            } else {
                EmbedderKind::Hashing
            },
            cache_dir: None,
        }
    }
}

impl AssistantConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.intent.validate().map_err(anyhow::Error::msg)?;
        anyhow::ensure!(
            self.wake.listen_seconds > 0.0 && self.audio.record_seconds > 0.0,
            "listen and record durations must be positive"
        );
        anyhow::ensure!(self.audio.sample_rate_hz > 0, "sample rate must be positive");
        anyhow::ensure!(
            !self.wake.phrase.trim().is_empty(),
            "wake phrase must not be empty"
        );
        Ok(())
    }
}

pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<AssistantConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let cfg: AssistantConfig = if raw.trim().is_empty() {
        AssistantConfig::default()
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config: {}", path.display()))?
    };
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
