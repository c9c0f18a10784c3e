//! Error types for Fortell.

use thiserror::Error;

/// Library-level error type for Fortell operations.
#[derive(Error, Debug)]
pub enum FortellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stage '{stage}' produced output of the wrong shape: {output}")]
    StageShape { stage: String, output: String },

    #[error("Stage '{0}' failed: {1}")]
    Stage(String, String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Audio assembly failed: {0}")]
    Assembly(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Fortell operations.
pub type Result<T> = std::result::Result<T, FortellError>;
