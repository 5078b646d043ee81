//! Common error types for image generation and persistence

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing credential for provider: {0}")]
    MissingCredential(String),

    #[error("Provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Failed to decode image payload: {0}")]
    Decode(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl AppError {
    /// Whether the error belongs to a single provider attempt.
    ///
    /// Transient errors are absorbed by the fallback loop; everything else
    /// (configuration, filesystem, bad input) is fatal for the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::HttpClient(_)
                | Self::MissingCredential(_)
                | Self::ProviderNotAvailable(_)
                | Self::Provider(_)
                | Self::Decode(_)
                | Self::Timeout(_)
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
