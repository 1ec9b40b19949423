// SPDX-License-Identifier: MPL-2.0

//! Keeps a chain of dependent selection controls (category → subcategory →
//! sub-subcategory → ...) consistent with the hierarchy held by the server.

pub mod api;
pub mod config;
pub mod error;
pub mod observability;
pub mod runtime;
pub mod widgets;

pub use api::{FetchError, FetchErrorKind, HierarchyClient, HierarchyResolver};
pub use crate::config::{CascadeConfig, LevelConfig};
pub use error::{CascadeError, ConfigError};
pub use observability::{FetchObserver, TracingObserver};
pub use runtime::{CascadeRuntime, RuntimeHandle};
pub use widgets::cascade::{
    ApplyOutcome, CascadeController, CascadeMessage, ChoiceOption, ControlState, Level,
    LoadStatus,
};
