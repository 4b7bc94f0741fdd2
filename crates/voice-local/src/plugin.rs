#[cfg(feature = "mock")]
use crate::{MockTts, ScriptedTranscriber};
use crate::{SttConfig, Transcriber, TtsConfig, TtsEngine};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriberKind {
    Mock,
    WhisperHttp,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsKind {
    Mock,
    Piper,
}

pub fn new_transcriber(
    kind: TranscriberKind,
    cfg: SttConfig,
) -> Result<Box<dyn Transcriber>, String> {
    match kind {
        TranscriberKind::Mock => {
            #[cfg(feature = "mock")]
            {
                let _ = cfg;
                Ok(Box::new(ScriptedTranscriber::default()))
            }
            #[cfg(not(feature = "mock"))]
            {
                let _ = cfg;
                Err("mock feature not enabled".into())
            }
        }
        TranscriberKind::WhisperHttp => {
            #[cfg(feature = "whisper_http")]
            {
                crate::WhisperHttpTranscriber::new(cfg)
                    .map(|t| Box::new(t) as Box<dyn Transcriber>)
                    .map_err(|e| e.to_string())
            }
            #[cfg(not(feature = "whisper_http"))]
            {
                let _ = cfg;
                Err("whisper_http feature not enabled".into())
            }
        }
    }
}

pub fn new_tts_engine(kind: TtsKind, cfg: TtsConfig) -> Result<Box<dyn TtsEngine>, String> {
    match kind {
        TtsKind::Mock => {
            #[cfg(feature = "mock")]
            {
                Ok(Box::new(MockTts::new(cfg.sample_rate_hz)))
            }
            #[cfg(not(feature = "mock"))]
            {
                let _ = cfg;
                Err("mock feature not enabled".into())
            }
        }
        TtsKind::Piper => {
            #[cfg(feature = "piper")]
            {
                Ok(Box::new(crate::PiperTts::new(cfg)))
            }
            #[cfg(not(feature = "piper"))]
            {
                let _ = cfg;
                Err("piper feature not enabled".into())
            }
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;

    #[test]
    fn mock_backends_are_always_available() {
        let t = new_transcriber(TranscriberKind::Mock, SttConfig::default()).unwrap();
        assert_eq!(t.name(), "scripted");
        let tts = new_tts_engine(TtsKind::Mock, TtsConfig::default()).unwrap();
        assert_eq!(tts.name(), "mock");
    }

    #[test]
    fn kinds_parse_from_snake_case() {
        let k: TranscriberKind = serde_json::from_str("\"whisper_http\"").unwrap();
        assert_eq!(k, TranscriberKind::WhisperHttp);
    }

    #[cfg(not(feature = "piper"))]
    #[test]
    fn disabled_backend_is_reported() {
        let err = new_tts_engine(TtsKind::Piper, TtsConfig::default()).err();
        assert_eq!(err.as_deref(), Some("piper feature not enabled"));
    }
}
