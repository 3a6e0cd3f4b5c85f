//! /add command - append a task, inline or interactively

use super::{enter_state, leave_state, Command, CommandInput};
use crate::db::ConvState;
use crate::runtime::Storage;
use async_trait::async_trait;

pub struct AddCommand;

impl AddCommand {
    pub const TOKEN: &'static str = "/add";
    pub const STATE: ConvState = ConvState::AwaitingTaskDescription;
}

#[async_trait]
impl Command for AddCommand {
    fn token(&self) -> Option<&'static str> {
        Some(Self::TOKEN)
    }

    fn handled_state(&self) -> Option<ConvState> {
        Some(Self::STATE)
    }

    async fn execute(
        &self,
        storage: &dyn Storage,
        conv_id: &str,
        input: &CommandInput,
        current_state: Option<ConvState>,
    ) -> String {
        // Follow-up: the whole message is the description
        if current_state == Some(Self::STATE) {
            let description = input.raw();
            if description.is_empty() {
                leave_state(storage, conv_id).await;
                return "Task addition cancelled as no description was provided. Type /add again to start over.".to_string();
            }
            add(storage, conv_id, description).await;
            leave_state(storage, conv_id).await;
            return confirmation(description);
        }

        if input.token() != Self::TOKEN {
            tracing::warn!(conv_id = %conv_id, text = %input.raw(), "Add command routed without its token");
            return "Error: AddCommand was called inappropriately.".to_string();
        }

        let description = input.raw_argument();
        if description.is_empty() {
            enter_state(storage, conv_id, Self::STATE).await;
            return "Okay, what is the task?".to_string();
        }

        add(storage, conv_id, description).await;
        confirmation(description)
    }
}

/// The confirmation is sent even when the write fails; the failure is logged
async fn add(storage: &dyn Storage, conv_id: &str, description: &str) {
    if let Err(e) = storage.add_task(conv_id, description).await {
        tracing::error!(conv_id = %conv_id, error = %e, "Failed to add task");
    }
}

fn confirmation(description: &str) -> String {
    format!("Task added: \"{description}\"")
}
