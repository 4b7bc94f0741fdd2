use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("audio device error: {0}")]
    Device(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("wav error: {0}")]
    Wav(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = core::result::Result<T, VoiceError>;
