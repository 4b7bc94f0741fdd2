//! voice-local: recording, speech-to-text, speech synthesis and playback
//! behind small blocking traits, with mock backends for tests.

mod error;
pub use error::{Result, VoiceError};

mod types;
pub use types::{AudioClip, RecorderConfig, SttConfig, TtsConfig};

mod traits;
pub use traits::{AudioSink, Recorder, Transcriber, TtsEngine};

pub mod wake;
pub use wake::{fold_vietnamese, WakeWordDetector};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{MemorySink, MockTts, ScriptedTranscriber, SilentRecorder};

#[cfg(feature = "wav")]
pub mod wav;

#[cfg(feature = "audio")]
pub mod mic;
#[cfg(feature = "audio")]
pub use mic::CpalRecorder;

#[cfg(feature = "playback")]
mod playback;
#[cfg(feature = "playback")]
pub use playback::RodioSink;

#[cfg(feature = "whisper_http")]
mod whisper_http;
#[cfg(feature = "whisper_http")]
pub use whisper_http::WhisperHttpTranscriber;

#[cfg(feature = "piper")]
mod piper;
#[cfg(feature = "piper")]
pub use piper::PiperTts;

pub mod plugin;
