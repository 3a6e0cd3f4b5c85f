//! HTTP API for the to-do bot
//!
//! The chat platform posts every conversation event to `POST /`.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(runtime: Arc<RuntimeManager>) -> Self {
        Self { runtime }
    }
}
