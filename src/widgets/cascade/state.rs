// SPDX-License-Identifier: MPL-2.0

//! Per-level state of the cascading controls.

use super::item::{ChoiceOption, OptionId};

/// Where a dependent control's option list came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Options are the initial or reset list; nothing requested.
    #[default]
    Idle,
    /// Children of `parent` are being fetched; options hold the placeholder only.
    Loading { parent: OptionId },
    /// Options are the children of `parent`.
    Loaded { parent: OptionId },
    /// Fetching the children of `parent` failed; options hold the placeholder only.
    Failed { parent: OptionId, error: String },
}

impl LoadStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, LoadStatus::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed { .. })
    }
}

/// Contents of one selection control.
///
/// Replaced wholesale on every parent change, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub selected: Option<OptionId>,
    pub options: Vec<ChoiceOption>,
    pub status: LoadStatus,
}

impl ControlState {
    /// A root control: options as given, no placeholder inserted.
    pub fn root(options: Vec<ChoiceOption>) -> Self {
        Self {
            selected: None,
            options,
            status: LoadStatus::Idle,
        }
    }

    /// Placeholder only, nothing selected.
    pub fn reset(placeholder_label: &str) -> Self {
        Self {
            selected: None,
            options: vec![ChoiceOption::placeholder(placeholder_label)],
            status: LoadStatus::Idle,
        }
    }

    /// Reset state shown while the children of `parent` are in flight.
    pub fn loading(placeholder_label: &str, parent: &str) -> Self {
        Self {
            status: LoadStatus::Loading {
                parent: parent.to_string(),
            },
            ..Self::reset(placeholder_label)
        }
    }

    /// Reset state left behind by a failed fetch.
    pub fn failed(placeholder_label: &str, parent: &str, error: String) -> Self {
        Self {
            status: LoadStatus::Failed {
                parent: parent.to_string(),
                error,
            },
            ..Self::reset(placeholder_label)
        }
    }

    /// Placeholder followed by `children` in the order given.
    pub fn with_children(placeholder_label: &str, parent: &str, children: Vec<ChoiceOption>) -> Self {
        let mut options = Vec::with_capacity(children.len() + 1);
        options.push(ChoiceOption::placeholder(placeholder_label));
        options.extend(children);
        Self {
            selected: None,
            options,
            status: LoadStatus::Loaded {
                parent: parent.to_string(),
            },
        }
    }

    /// Server-rendered dependent control: placeholder, the given options, and
    /// an optional preselected id.
    pub fn initial(
        placeholder_label: &str,
        options: Vec<ChoiceOption>,
        selected: Option<OptionId>,
    ) -> Self {
        let mut options = options;
        if !options.first().is_some_and(ChoiceOption::is_placeholder) {
            options.insert(0, ChoiceOption::placeholder(placeholder_label));
        }
        Self {
            selected: selected.filter(|id| !id.is_empty()),
            options,
            status: LoadStatus::Idle,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// True when `id` is one of the options. The empty id always matches.
    pub fn contains(&self, id: &str) -> bool {
        id.is_empty() || self.options.iter().any(|o| o.id == id)
    }

    /// Display labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }

    /// True when only the placeholder is offered and nothing is selected.
    pub fn is_reset(&self) -> bool {
        self.selected.is_none() && self.options.len() == 1 && self.options[0].is_placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let state = ControlState::reset("---------");
        assert!(state.is_reset());
        assert_eq!(state.labels(), ["---------"]);
        assert_eq!(state.status, LoadStatus::Idle);
    }

    #[test]
    fn test_with_children_prepends_placeholder() {
        let state = ControlState::with_children(
            "---------",
            "5",
            vec![ChoiceOption::new("10", "Sub A"), ChoiceOption::new("11", "Sub B")],
        );
        assert_eq!(state.labels(), ["---------", "Sub A", "Sub B"]);
        assert!(state.selected.is_none());
        assert!(state.contains("11"));
        assert!(!state.contains("12"));
        assert!(!state.is_reset());
    }

    #[test]
    fn test_initial_keeps_existing_placeholder() {
        let state = ControlState::initial(
            "---------",
            vec![ChoiceOption::placeholder("---------"), ChoiceOption::new("10", "Sub A")],
            Some("10".to_string()),
        );
        assert_eq!(state.options.len(), 2);
        assert_eq!(state.selected_id(), Some("10"));

        let state = ControlState::initial("---------", vec![], Some(String::new()));
        assert!(state.is_reset());
    }

    #[test]
    fn test_loading_and_failed_show_placeholder_only() {
        let loading = ControlState::loading("---------", "5");
        assert!(loading.status.is_loading());
        assert_eq!(loading.labels(), ["---------"]);

        let failed = ControlState::failed("---------", "5", "boom".to_string());
        assert!(failed.status.is_failed());
        assert_eq!(failed.labels(), ["---------"]);
    }
}
