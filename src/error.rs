use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid source: {reason}")]
    InvalidSource { reason: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("Render error: {reason}")]
    Render { reason: String },

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BlogContentError>;
