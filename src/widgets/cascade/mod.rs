// SPDX-License-Identifier: MPL-2.0

//! Cascading selection controls.
//!
//! A chain of controls where each level lists the children of the selection
//! one level up (category → subcategory → sub-subcategory → ...). Changing a
//! selection resets every control below it and fetches the children for the
//! next level only.
//!
//! # Example
//!
//! ```ignore
//! let mut controller = CascadeController::builder(resolver)
//!     .from_config(&config)
//!     .roots(categories)
//!     .build()?;
//!
//! // User picks category 5: level 1 is reset at once and a fetch is returned.
//! if let Some(task) = controller.select(0, "5")? {
//!     let message = task.await;
//!     controller.update(message)?;
//! }
//! assert_eq!(controller.state(1).unwrap().labels(), ["---------", "Sub A", "Sub B"]);
//! ```

mod controller;
mod item;
mod message;
mod state;
mod view;

pub use controller::{CascadeBuilder, CascadeController, Task};
pub use item::{ChoiceOption, Level, OptionId};
pub use message::{ApplyOutcome, CascadeMessage, FetchCompletion};
pub use state::{ControlState, LoadStatus};
pub use view::ControlView;
