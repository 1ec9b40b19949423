// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

use crate::widgets::cascade::Level;

/// Failure of a single children lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    Transport(String),
    #[error("Request failed: server returned status {status} - {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response: {0}")]
    ResponseFormat(String),
    /// The resolver has no endpoint for the requested level. Reported like an
    /// unreachable service.
    #[error("No endpoint configured for level {level}")]
    NoEndpoint { level: Level },
}

/// Coarse classification reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    TransportFailure,
    ResponseFormatError,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::TransportFailure => "transport_failure",
            FetchErrorKind::ResponseFormatError => "response_format_error",
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Transport(_) | FetchError::Status { .. } | FetchError::NoEndpoint { .. } => {
                FetchErrorKind::TransportFailure
            }
            FetchError::ResponseFormat(_) => FetchErrorKind::ResponseFormatError,
        }
    }
}
