//! /help command - list available commands

use super::{Command, CommandInput};
use crate::db::ConvState;
use crate::runtime::Storage;
use async_trait::async_trait;

pub struct HelpCommand;

impl HelpCommand {
    pub const TOKEN: &'static str = "/help";
}

#[async_trait]
impl Command for HelpCommand {
    fn token(&self) -> Option<&'static str> {
        Some(Self::TOKEN)
    }

    fn handled_state(&self) -> Option<ConvState> {
        None
    }

    async fn execute(
        &self,
        _storage: &dyn Storage,
        _conv_id: &str,
        _input: &CommandInput,
        _current_state: Option<ConvState>,
    ) -> String {
        help_message()
    }
}

pub fn help_message() -> String {
    "Available commands:
/add <task description> - Add a new task
/add - Add a new task (interactive)
/view - View all tasks
/delete - Delete a task by number
/done - Mark a task as done by number
/help - Show this help message"
        .to_string()
}
