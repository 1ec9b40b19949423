// SPDX-License-Identifier: MPL-2.0

//! Error types for configuration and controller misuse.
//!
//! Fetch failures have their own type, [`crate::api::FetchError`], because they
//! are absorbed by the controller rather than returned to callers.

use thiserror::Error;

use crate::widgets::cascade::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("levels must be numbered 1..=N in order: expected level {expected}, found {found}")]
    LevelOrder { expected: Level, found: Level },

    #[error("endpoint for level {level} has no {{parent}} marker: {endpoint}")]
    MissingParentMarker { level: Level, endpoint: String },

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Rejected controller input. State is left untouched when one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CascadeError {
    #[error("no control at level {level} (chain depth {depth})")]
    UnknownLevel { level: Level, depth: usize },

    #[error("'{id}' is not an option of the level {level} control")]
    UnknownOption { level: Level, id: String },

    #[error("runtime has shut down")]
    RuntimeClosed,
}
