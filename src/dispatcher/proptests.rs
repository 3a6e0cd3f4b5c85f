//! Property-based tests for command selection
//!
//! Selection must be a pure function of (state, text) with a fixed priority
//! order.

use super::*;
use crate::commands::{AddCommand, DeleteCommand, DoneCommand, ViewCommand};
use crate::runtime::testing::{InMemoryStorage, RecordingMessenger};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn dispatcher() -> Dispatcher {
    Dispatcher::new(
        Arc::new(InMemoryStorage::new()),
        Arc::new(RecordingMessenger::new()),
    )
}

fn owner_of(state: ConvState) -> &'static str {
    match state {
        ConvState::AwaitingTaskDescription => AddCommand::TOKEN,
        ConvState::AwaitingTaskToDelete => DeleteCommand::TOKEN,
        ConvState::AwaitingTaskToMarkDone => DoneCommand::TOKEN,
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = Option<ConvState>> {
    prop_oneof![
        Just(None),
        Just(Some(ConvState::AwaitingTaskDescription)),
        Just(Some(ConvState::AwaitingTaskToDelete)),
        Just(Some(ConvState::AwaitingTaskToMarkDone)),
    ]
}

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(AddCommand::TOKEN.to_string()),
        Just(DeleteCommand::TOKEN.to_string()),
        Just(DoneCommand::TOKEN.to_string()),
        Just(ViewCommand::TOKEN.to_string()),
        Just(HelpCommand::TOKEN.to_string()),
        Just("/HELP".to_string()),
        Just("/Add".to_string()),
        "[0-9]{1,4}",
        "[a-z]{1,8}",
    ]
}

fn arb_message() -> impl Strategy<Value = String> {
    (arb_token(), "( [a-zA-Z0-9]{0,6}){0,3}").prop_map(|(token, rest)| format!("{token}{rest}"))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn selection_is_deterministic(state in arb_state(), text in arb_message()) {
        let dispatcher = dispatcher();
        let input = CommandInput::new(&text);

        let first = dispatcher.select(state, &input);
        let second = dispatcher.select(state, &input);

        prop_assert_eq!(first.route, second.route);
        prop_assert!(Arc::ptr_eq(&first.command, &second.command));
    }

    #[test]
    fn help_token_always_selects_help(state in arb_state(), rest in "( [a-z0-9]{1,5}){0,2}") {
        let dispatcher = dispatcher();
        let input = CommandInput::new(&format!("/help{rest}"));

        let selection = dispatcher.select(state, &input);
        prop_assert_eq!(selection.route, Route::HelpOverride);
        prop_assert_eq!(selection.command.token(), Some(HelpCommand::TOKEN));
    }

    #[test]
    fn pending_state_beats_tokens(state in arb_state(), text in arb_message()) {
        let dispatcher = dispatcher();
        let input = CommandInput::new(&text);
        prop_assume!(input.token() != HelpCommand::TOKEN);

        let selection = dispatcher.select(state, &input);
        match state {
            Some(state) => {
                prop_assert_eq!(selection.route, Route::State(state));
                prop_assert_eq!(selection.command.token(), Some(owner_of(state)));
            }
            None => prop_assert_ne!(selection.route, Route::HelpOverride),
        }
    }

    #[test]
    fn without_state_token_or_fallback(text in arb_message()) {
        let dispatcher = dispatcher();
        let input = CommandInput::new(&text);
        let known = [
            AddCommand::TOKEN,
            DeleteCommand::TOKEN,
            DoneCommand::TOKEN,
            ViewCommand::TOKEN,
        ];

        let selection = dispatcher.select(None, &input);
        if input.token() == HelpCommand::TOKEN {
            prop_assert_eq!(selection.route, Route::HelpOverride);
        } else if known.contains(&input.token()) {
            prop_assert_eq!(selection.route, Route::Token);
            prop_assert_eq!(selection.command.token(), Some(input.token()));
        } else {
            prop_assert_eq!(selection.route, Route::Fallback);
            prop_assert_eq!(selection.command.token(), Some(HelpCommand::TOKEN));
        }
    }
}
