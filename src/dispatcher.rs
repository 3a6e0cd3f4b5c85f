//! Command dispatcher
//!
//! Picks exactly one command per inbound message. Selection order:
//!
//! 1. `/help` always wins, even in the middle of a flow
//! 2. a pending follow-up state routes to the command that owns it
//! 3. the first token routes to the command registered for it
//! 4. otherwise the fallback (help) command runs

#[cfg(test)]
mod proptests;

use crate::commands::{standard_commands, Command, CommandInput, HelpCommand};
use crate::db::ConvState;
use crate::runtime::{Messenger, Storage};
use std::collections::HashMap;
use std::sync::Arc;

/// Why a command was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    HelpOverride,
    State(ConvState),
    Token,
    Fallback,
}

/// Outcome of command selection
pub struct Selection {
    pub command: Arc<dyn Command>,
    pub route: Route,
}

pub struct Dispatcher {
    by_token: HashMap<&'static str, Arc<dyn Command>>,
    by_state: HashMap<ConvState, Arc<dyn Command>>,
    fallback: Arc<dyn Command>,
    storage: Arc<dyn Storage>,
    messenger: Arc<dyn Messenger>,
}

impl Dispatcher {
    /// Dispatcher over the standard command set
    pub fn new(storage: Arc<dyn Storage>, messenger: Arc<dyn Messenger>) -> Self {
        Self::with_commands(storage, messenger, standard_commands())
    }

    /// Build the lookup tables. Duplicate keys are logged; the later
    /// registration wins.
    pub fn with_commands(
        storage: Arc<dyn Storage>,
        messenger: Arc<dyn Messenger>,
        commands: Vec<Arc<dyn Command>>,
    ) -> Self {
        let mut by_token: HashMap<&'static str, Arc<dyn Command>> = HashMap::new();
        let mut by_state: HashMap<ConvState, Arc<dyn Command>> = HashMap::new();

        for command in commands {
            if let Some(token) = command.token() {
                if by_token.insert(token, command.clone()).is_some() {
                    tracing::warn!(token, "Duplicate command token registration");
                }
            }
            if let Some(state) = command.handled_state() {
                if by_state.insert(state, command.clone()).is_some() {
                    tracing::warn!(state = %state, "Duplicate state handler registration");
                }
            }
        }

        let fallback: Arc<dyn Command> = by_token
            .get(HelpCommand::TOKEN)
            .cloned()
            .unwrap_or_else(|| Arc::new(HelpCommand));
        by_token.entry(HelpCommand::TOKEN).or_insert_with(|| fallback.clone());

        tracing::debug!(
            tokens = ?by_token.keys().collect::<Vec<_>>(),
            states = ?by_state.keys().collect::<Vec<_>>(),
            "Commands registered"
        );

        Self {
            by_token,
            by_state,
            fallback,
            storage,
            messenger,
        }
    }

    /// Pure selection: depends only on the state and the message text
    pub fn select(&self, current_state: Option<ConvState>, input: &CommandInput) -> Selection {
        let token = input.token();

        if token == HelpCommand::TOKEN {
            if let Some(help) = self.by_token.get(HelpCommand::TOKEN) {
                return Selection {
                    command: help.clone(),
                    route: Route::HelpOverride,
                };
            }
        }

        if let Some(state) = current_state {
            if let Some(command) = self.by_state.get(&state) {
                return Selection {
                    command: command.clone(),
                    route: Route::State(state),
                };
            }
        }

        if let Some(command) = self.by_token.get(token) {
            return Selection {
                command: command.clone(),
                route: Route::Token,
            };
        }

        Selection {
            command: self.fallback.clone(),
            route: Route::Fallback,
        }
    }

    /// Resolve and run the command for one message, returning its reply
    pub async fn dispatch(&self, conv_id: &str, input: &CommandInput) -> String {
        let current_state = self.storage.get_state(conv_id).await.unwrap_or_else(|e| {
            tracing::error!(conv_id = %conv_id, error = %e, "Failed to load conversation state");
            None
        });

        let Selection { command, route } = self.select(current_state, input);
        tracing::debug!(
            conv_id = %conv_id,
            route = ?route,
            command = command.token().unwrap_or("-"),
            "Command selected"
        );

        command
            .execute(self.storage.as_ref(), conv_id, input, current_state)
            .await
    }

    /// Dispatch a message and deliver the reply. Delivery failures are
    /// logged and never retried.
    pub async fn handle_message(&self, conv_id: &str, text: &str) -> String {
        let input = CommandInput::new(text);
        let reply = self.dispatch(conv_id, &input).await;

        if reply.is_empty() {
            return reply;
        }

        match self.messenger.send_message(conv_id, &reply).await {
            Ok(()) => tracing::info!(conv_id = %conv_id, reply = %reply, "Sent response"),
            Err(e) => tracing::error!(
                conv_id = %conv_id,
                error = %e,
                retryable = e.kind.is_retryable(),
                "Failed to send message"
            ),
        }

        reply
    }
}
