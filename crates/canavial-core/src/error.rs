//! Centralized error types for Canavial.
//!
//! Errors a user can see carry a `user_message()`; the `Display` impl keeps
//! the technical detail for logs.

use thiserror::Error;

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Configuração inválida. Verifique os ajustes.",
            ConfigError::ParseError(_) => "Arquivo de configuração malformado.",
        }
    }
}

/// City search errors surfaced to the host.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Suggestion lookup failed: {0}")]
    LookupFailed(String),
}

impl SearchError {
    /// The inline message shown under the search field.
    pub const SUGGESTIONS_FAILED: &'static str = "Falha ao buscar sugestões";

    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::LookupFailed(_) => Self::SUGGESTIONS_FAILED,
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
