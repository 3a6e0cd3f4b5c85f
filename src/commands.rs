//! Chat commands
//!
//! Each command answers to a literal token (`/add`), resumes a follow-up
//! state, or both. The dispatcher decides which one runs; commands own their
//! own state transitions.

mod add;
mod delete;
mod done;
mod help;
mod view;

pub use add::AddCommand;
pub use delete::DeleteCommand;
pub use done::DoneCommand;
pub use help::{help_message, HelpCommand};
pub use view::ViewCommand;

use crate::db::{render_tasks, ConvState, Task};
use crate::runtime::Storage;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A command the bot understands
#[async_trait]
pub trait Command: Send + Sync {
    /// Literal token users type, e.g. `/add`
    fn token(&self) -> Option<&'static str>;

    /// Follow-up state this command resumes
    fn handled_state(&self) -> Option<ConvState>;

    /// Run the command and produce the reply text
    async fn execute(
        &self,
        storage: &dyn Storage,
        conv_id: &str,
        input: &CommandInput,
        current_state: Option<ConvState>,
    ) -> String;
}

/// Registration order is fixed, so duplicate keys resolve deterministically
pub fn standard_commands() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(AddCommand),
        Arc::new(DeleteCommand),
        Arc::new(DoneCommand),
        Arc::new(HelpCommand),
        Arc::new(ViewCommand),
    ]
}

/// An inbound message as commands see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInput {
    raw: String,
    normalized: String,
}

impl CommandInput {
    pub fn new(text: &str) -> Self {
        let raw = text.trim().to_string();
        let normalized = raw.to_lowercase();
        Self { raw, normalized }
    }

    /// Trimmed text in its original case
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, lowercased text
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// First whitespace-delimited token of the normalized text
    pub fn token(&self) -> &str {
        self.normalized.split_whitespace().next().unwrap_or("")
    }

    /// Raw text after the first token, trimmed
    pub fn raw_argument(&self) -> &str {
        self.raw
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim())
    }
}

// ============================================================================
// Store helpers: failures are logged and treated as "no data"
// ============================================================================

async fn load_tasks(storage: &dyn Storage, conv_id: &str) -> Vec<Task> {
    storage.get_tasks(conv_id).await.unwrap_or_else(|e| {
        tracing::error!(conv_id = %conv_id, error = %e, "Failed to load tasks");
        Vec::new()
    })
}

async fn task_list_text(storage: &dyn Storage, conv_id: &str) -> String {
    render_tasks(&load_tasks(storage, conv_id).await)
}

async fn enter_state(storage: &dyn Storage, conv_id: &str, state: ConvState) {
    if let Err(e) = storage.set_state(conv_id, state).await {
        tracing::error!(conv_id = %conv_id, state = %state, error = %e, "Failed to set state");
    }
}

async fn leave_state(storage: &dyn Storage, conv_id: &str) {
    if let Err(e) = storage.clear_state(conv_id).await {
        tracing::error!(conv_id = %conv_id, error = %e, "Failed to clear state");
    }
}

/// A follow-up reply read as a task number
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskNumber {
    /// Saturates at the `i64` bounds; such values are never a valid position
    value: i64,
    /// Canonical decimal form, echoed back to the user
    text: String,
}

impl fmt::Display for TaskNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse a follow-up reply as a task number.
///
/// Accepts an optional sign, ASCII, Persian and Arabic-Indic digits, and
/// single underscores between digits. Numbers of any length parse.
fn parse_task_number(text: &str) -> Option<TaskNumber> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let mut digits = String::with_capacity(body.len());
    let mut after_separator = true;
    for c in body.chars() {
        if c == '_' {
            if after_separator {
                return None;
            }
            after_separator = true;
            continue;
        }
        digits.push(ascii_digit(c)?);
        after_separator = false;
    }
    if digits.is_empty() || after_separator {
        return None;
    }

    let magnitude = match digits.trim_start_matches('0') {
        "" => "0",
        m => m,
    };
    let text = if negative && magnitude != "0" {
        format!("-{magnitude}")
    } else {
        magnitude.to_string()
    };
    let value = text
        .parse()
        .unwrap_or(if negative { i64::MIN } else { i64::MAX });

    Some(TaskNumber { value, text })
}

fn ascii_digit(c: char) -> Option<char> {
    let offset = match c {
        '0'..='9' => return Some(c),
        '\u{06F0}'..='\u{06F9}' => u32::from(c) - 0x06F0,
        '\u{0660}'..='\u{0669}' => u32::from(c) - 0x0660,
        _ => return None,
    };
    char::from_digit(offset, 10)
}
