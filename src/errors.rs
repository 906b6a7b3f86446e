/*!
 * Error types for the subvtt application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to a completion provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The call did not complete within its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    ///
    /// Transport failures, timeouts, server errors and throttling responses are
    /// transient. Client errors and unparseable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) => false,
        }
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A timestamp did not match `HH:MM:SS,mmm`
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The formatter received a different number of translations than cues
    #[error("Expected {expected} translations for '{language}', got {actual}")]
    TranslationCountMismatch {
        /// Target language of the output document
        language: String,
        /// Number of cues in the document
        expected: usize,
        /// Number of translations supplied
        actual: usize,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Every attempt failed with a transient error
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total number of attempts made, including the first
        attempts: u32,
        /// The last error observed
        source: ProviderError,
    },

    /// The provider returned an error that retrying cannot fix
    #[error("Provider error: {0}")]
    NonRetryable(ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
