// SPDX-License-Identifier: MPL-2.0

//! Messages consumed by the cascade controller.

use super::item::{ChoiceOption, Level, OptionId};
use crate::api::FetchError;

/// Result of one children fetch, tagged with the generation it was issued under.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    /// Level whose options were fetched.
    pub level: Level,
    /// The selection the children belong to.
    pub parent: OptionId,
    /// Generation of `level` when the fetch started.
    pub generation: u64,
    pub result: Result<Vec<ChoiceOption>, FetchError>,
}

/// Input to [`super::CascadeController::update`].
#[derive(Debug, Clone)]
pub enum CascadeMessage {
    /// The control at `level` changed its selection. An empty id clears it.
    SelectionChanged {
        level: Level,
        selected: OptionId,
    },

    /// A fetch issued by the controller finished.
    ChildrenLoaded(FetchCompletion),
}

/// What applying a fetch completion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The control now lists `count` children after the placeholder.
    Applied { count: usize },
    /// The fetch failed; the control was left in the reset state.
    Failed,
    /// A newer change superseded the fetch; nothing was touched.
    Stale,
}
