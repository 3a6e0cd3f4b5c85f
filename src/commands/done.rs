//! /done command - mark a task as done by its current number

use super::{enter_state, leave_state, load_tasks, parse_task_number, task_list_text};
use super::{Command, CommandInput};
use crate::db::{position_to_index, render_tasks, ConvState};
use crate::runtime::Storage;
use async_trait::async_trait;

pub struct DoneCommand;

impl DoneCommand {
    pub const TOKEN: &'static str = "/done";
    pub const STATE: ConvState = ConvState::AwaitingTaskToMarkDone;
}

#[async_trait]
impl Command for DoneCommand {
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
        if current_state != Some(Self::STATE) {
            let tasks = load_tasks(storage, conv_id).await;
            if tasks.is_empty() {
                return "No tasks to mark as done.".to_string();
            }
            enter_state(storage, conv_id, Self::STATE).await;
            return format!(
                "Which task number to mark as done?\n{}",
                render_tasks(&tasks)
            );
        }

        leave_state(storage, conv_id).await;

        let Some(number) = parse_task_number(input.normalized()) else {
            return "Invalid input. Please send a valid task number. Marking as done cancelled."
                .to_string();
        };

        let marked = match storage.mark_done(conv_id, number.value).await {
            Ok(applied) => applied,
            Err(e) => {
                // The reply follows the range check even if the write was lost
                tracing::error!(conv_id = %conv_id, number = %number, error = %e, "Failed to mark task done");
                let len = load_tasks(storage, conv_id).await.len();
                position_to_index(number.value, len).is_some()
            }
        };

        if marked {
            format!("Task {number} marked as done.")
        } else {
            format!(
                "Invalid task number: {number}. Task list:\n{}",
                task_list_text(storage, conv_id).await
            )
        }
    }
}
