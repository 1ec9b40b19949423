// SPDX-License-Identifier: MPL-2.0

//! Handles to the rendered controls, injected into the controller.

use tokio::sync::watch;

use super::item::Level;
use super::state::ControlState;

/// Receives every wholesale replacement of one control's state.
pub trait ControlView: Send {
    fn replace(&mut self, level: Level, state: &ControlState);
}

/// Publishes the latest state to any number of `watch::Receiver`s.
impl ControlView for watch::Sender<ControlState> {
    fn replace(&mut self, _level: Level, state: &ControlState) {
        self.send_replace(state.clone());
    }
}

impl<F> ControlView for F
where
    F: FnMut(Level, &ControlState) + Send,
{
    fn replace(&mut self, level: Level, state: &ControlState) {
        self(level, state)
    }
}
