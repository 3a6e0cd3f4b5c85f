//! Per-conversation follow-up state
//!
//! A conversation is either free (no record) or waiting for the answer to a
//! prompt one of the commands issued.

mod state;

pub use state::ConvState;
