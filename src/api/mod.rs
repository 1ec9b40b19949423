// SPDX-License-Identifier: MPL-2.0

//! Client side of the hierarchy children endpoints.

mod error;
mod hierarchy;
mod payload;

pub use error::{FetchError, FetchErrorKind};
pub use hierarchy::{HierarchyClient, HierarchyResolver};
pub use payload::normalize_children;
