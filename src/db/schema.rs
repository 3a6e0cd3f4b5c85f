//! Database schema and types

pub use crate::state_machine::ConvState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    conversation_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    task_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    done BOOLEAN NOT NULL DEFAULT 0,

    PRIMARY KEY (conversation_id, position)
);

CREATE TABLE IF NOT EXISTS conversation_states (
    conversation_id TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Reply used whenever a conversation has no tasks
pub const NO_TASKS_TEXT: &str = "You have no tasks. Add one with /add <task description>.";

/// A single to-do item
///
/// `id` is the position the task was appended at. It is not renumbered on
/// deletion; users always refer to tasks by their current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub description: String,
    pub done: bool,
}

impl Task {
    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            done: false,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.done { "[X]" } else { "[ ]" };
        write!(f, "{status} {}", self.description)
    }
}

/// Render a task list the way users see it: `"{position}. [ ] {description}"`
/// per line, positions 1-based.
pub fn render_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return NO_TASKS_TEXT.to_string();
    }

    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| format!("{}. {task}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a user-supplied 1-based task number into a list index
pub fn position_to_index(number: i64, len: usize) -> Option<usize> {
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    (index < len).then_some(index)
}

/// Id for a task appended to a list of `len` tasks
pub fn next_task_id(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |n| n.saturating_add(1))
}
