use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestboardError {
    #[error("Malformed report item {id}: {reason}")]
    MalformedItem { id: String, reason: String },

    #[error("Transport channel closed")]
    ChannelClosed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, TestboardError>;
