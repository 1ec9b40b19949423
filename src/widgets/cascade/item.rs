// SPDX-License-Identifier: MPL-2.0

//! Option types for cascading selection controls.

/// Position in the chain: 0 is the root (category), 1 its children, and so on.
pub type Level = usize;

/// Identifier of an option. The empty string means "no selection".
pub type OptionId = String;

/// One entry of a selection control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Identifier submitted with the form; empty for the placeholder.
    pub id: OptionId,
    /// Display label.
    pub label: String,
    /// URL slug, when the endpoint provides one.
    pub slug: Option<String>,
}

impl ChoiceOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            slug: None,
        }
    }

    /// The "unselected" sentinel heading every dependent control.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self::new(String::new(), label)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }
}
