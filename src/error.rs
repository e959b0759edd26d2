// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for hrq
//!
//! Every error is returned from the call that detected it. Nothing here is
//! retried or logged by the library itself.

use thiserror::Error;

/// Result type alias for hrq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hrq
#[derive(Error, Debug)]
pub enum Error {
    /// Payload shape does not fit the declared content type
    #[error("payload of kind {payload} cannot be encoded as {content_type}")]
    TypeMismatch {
        content_type: String,
        payload: &'static str,
    },

    /// Body could not be serialized or compressed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Connection, DNS, TLS or timeout failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Redirect chain hit the configured cap
    #[error("Stopped after {count} redirects at {url}")]
    TooManyRedirects { url: String, count: usize },

    /// Response body could not be decoded
    #[error("Decode error ({encoding}): {reason}")]
    Decode { encoding: String, reason: String },

    /// Response body is not valid JSON for the requested type
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Header name or value rejected by the builder
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// I/O error (reading attached files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(content_type: impl Into<String>, payload: &'static str) -> Self {
        Error::TypeMismatch {
            content_type: content_type.into(),
            payload,
        }
    }

    /// Create an encoding error
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create a decode error
    pub fn decode(encoding: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Decode {
            encoding: encoding.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Error::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Check if the transport failed (redirect cap included)
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::TooManyRedirects { .. })
    }

    /// Check if this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if the redirect cap was hit
    pub fn is_redirect_limit(&self) -> bool {
        matches!(self, Error::TooManyRedirects { .. })
    }

    /// Check if the caller could reasonably retry the same request
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if the caller has to fix the request before sending again
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. }
                | Error::Encoding(_)
                | Error::Url(_)
                | Error::InvalidHeader { .. }
        )
    }

    /// Get the URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::TooManyRedirects { url, .. } => Some(url),
            Error::Transport(e) => e.url().map(|u| u.as_str()),
            _ => None,
        }
    }
}
