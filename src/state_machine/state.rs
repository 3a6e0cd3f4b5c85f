//! Conversation state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Follow-up flow a conversation is currently in.
///
/// Persisted as tagged JSON (`{"type":"awaiting_task_to_delete"}`). Variants
/// carry only what their owning command needs to resume, which today is
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// `/add` was sent bare; the next message is the task description
    AwaitingTaskDescription,
    /// `/delete` listed the tasks; the next message is a task number
    AwaitingTaskToDelete,
    /// `/done` listed the tasks; the next message is a task number
    AwaitingTaskToMarkDone,
}

impl ConvState {
    pub const ALL: [ConvState; 3] = [
        ConvState::AwaitingTaskDescription,
        ConvState::AwaitingTaskToDelete,
        ConvState::AwaitingTaskToMarkDone,
    ];

    /// Stable state name, identical to the serde tag
    pub fn name(self) -> &'static str {
        match self {
            ConvState::AwaitingTaskDescription => "awaiting_task_description",
            ConvState::AwaitingTaskToDelete => "awaiting_task_to_delete",
            ConvState::AwaitingTaskToMarkDone => "awaiting_task_to_mark_done",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.name() == name)
    }

    pub fn to_json(self) -> String {
        serde_json::json!({ "type": self.name() }).to_string()
    }

    /// Decode a persisted state. Accepts the tagged JSON form and a bare name.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw)
            .ok()
            .or_else(|| Self::from_name(raw.trim()))
    }
}

impl fmt::Display for ConvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
