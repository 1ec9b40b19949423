// SPDX-License-Identifier: MPL-2.0

//! Selection control state for the admin forms.

pub mod cascade;

pub use cascade::{
    ApplyOutcome, CascadeBuilder, CascadeController, CascadeMessage, ChoiceOption, ControlState,
    ControlView, FetchCompletion, Level, LoadStatus, OptionId, Task,
};
