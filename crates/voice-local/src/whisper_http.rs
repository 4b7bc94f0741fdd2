use crate::wav::encode_wav;
use crate::{AudioClip, Result, SttConfig, Transcriber, VoiceError};
use reqwest::blocking::{multipart, Client};
use std::time::Duration;
use tracing::debug;

/// Transcribes through a whisper.cpp-style `/inference` endpoint.
pub struct WhisperHttpTranscriber {
    config: SttConfig,
    client: Client,
}

impl WhisperHttpTranscriber {
    pub fn new(config: SttConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| VoiceError::Http(e.to_string()))?;
        Ok(Self { config, client })
    }
}

impl Transcriber for WhisperHttpTranscriber {
    fn name(&self) -> &str {
        "whisper-http"
    }

    fn transcribe(&mut self, clip: &AudioClip) -> Result<String> {
        if clip.is_empty() {
            return Ok(String::new());
        }
        let bytes = encode_wav(clip)?;
        let file = multipart::Part::bytes(bytes)
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::Http(e.to_string()))?;
        let mut form = multipart::Form::new()
            .part("file", file)
            .text("response_format", "json")
            .text("temperature", "0");
        if let Some(lang) = &self.config.language {
            form = form.text("language", lang.clone());
        }

        let resp = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| VoiceError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(VoiceError::Http(format!("stt server: {}", resp.status())));
        }
        let body = resp.text().map_err(|e| VoiceError::Http(e.to_string()))?;
        debug!(len = body.len(), "stt response");
        Ok(parse_transcript(&body))
    }
}

/// `{"text": "..."}`, or the raw body when it is not JSON.
fn parse_transcript(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
            return text.trim().to_string();
        }
    }
    body.trim().to_string()
}
