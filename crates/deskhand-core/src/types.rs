use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// MouseButton
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One unit of simulated input or a timing directive.
///
/// Discriminated by the JSON `"type"` field. Field names follow the wire
/// format sent by the coordinator (`key`, `ms`); the descriptive names are
/// accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Press then release a single named key.
    Key {
        #[serde(alias = "name")]
        key: String,
    },
    /// Move the pointer to an absolute position, then click.
    Click {
        x: i32,
        y: i32,
        #[serde(default)]
        button: MouseButton,
    },
    /// Suspend the interpreter for `ms` milliseconds.
    Wait {
        #[serde(alias = "duration_ms")]
        ms: u64,
    },
    /// Type `text` verbatim.
    Type { text: String },
    /// Press every key in order, then release them in reverse order.
    KeyCombination { keys: Vec<String> },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Key { .. } => ActionKind::Key,
            Action::Click { .. } => ActionKind::Click,
            Action::Wait { .. } => ActionKind::Wait,
            Action::Type { .. } => ActionKind::Type,
            Action::KeyCombination { .. } => ActionKind::KeyCombination,
        }
    }
}

/// Field-less mirror of [`Action`], used in logs and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Key,
    Click,
    Wait,
    Type,
    KeyCombination,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Key => "key",
            ActionKind::Click => "click",
            ActionKind::Wait => "wait",
            ActionKind::Type => "type",
            ActionKind::KeyCombination => "key_combination",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered list of actions from one `execute_actions` request.
pub type ActionBatch = Vec<Action>;
