//! /view command - show the task list

use super::{task_list_text, Command, CommandInput};
use crate::db::ConvState;
use crate::runtime::Storage;
use async_trait::async_trait;

pub struct ViewCommand;

impl ViewCommand {
    pub const TOKEN: &'static str = "/view";
}

#[async_trait]
impl Command for ViewCommand {
    fn token(&self) -> Option<&'static str> {
        Some(Self::TOKEN)
    }

    fn handled_state(&self) -> Option<ConvState> {
        None
    }

    async fn execute(
        &self,
        storage: &dyn Storage,
        conv_id: &str,
        _input: &CommandInput,
        _current_state: Option<ConvState>,
    ) -> String {
        task_list_text(storage, conv_id).await
    }
}
