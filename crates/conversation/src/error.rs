use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(String),
    #[error("model returned no message")]
    EmptyResponse,
}

pub type Result<T> = core::result::Result<T, ConversationError>;
