//! Trait abstractions for runtime I/O
//!
//! Commands and the dispatcher only see these traits, so tests can swap the
//! SQLite store and the HTTP messenger for in-memory mocks.

use crate::db::{render_tasks, ConvState, Database, Task};
use crate::messenger::MessengerError;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for per-conversation task lists
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Get all tasks for a conversation, empty if none
    async fn get_tasks(&self, conv_id: &str) -> Result<Vec<Task>, String>;

    /// Replace the full task list
    #[allow(dead_code)] // API completeness
    async fn save_tasks(&self, conv_id: &str, tasks: &[Task]) -> Result<(), String>;

    /// Append a task with `done = false`
    async fn add_task(&self, conv_id: &str, description: &str) -> Result<Task, String>;

    /// Remove the task at a 1-based position; `false` if out of range
    async fn delete_task(&self, conv_id: &str, number: i64) -> Result<bool, String>;

    /// Mark the task at a 1-based position as done; `false` if out of range
    async fn mark_done(&self, conv_id: &str, number: i64) -> Result<bool, String>;

    /// Render the task list for display
    async fn tasks_as_text(&self, conv_id: &str) -> Result<String, String> {
        let tasks = self.get_tasks(conv_id).await?;
        Ok(render_tasks(&tasks))
    }
}

/// Storage for conversation follow-up state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the current state, `None` when no flow is pending
    async fn get_state(&self, conv_id: &str) -> Result<Option<ConvState>, String>;

    /// Store or overwrite the state
    async fn set_state(&self, conv_id: &str, state: ConvState) -> Result<(), String>;

    /// Remove any state record
    async fn clear_state(&self, conv_id: &str) -> Result<(), String>;

    /// Set the state, or clear it when `state` is `None`
    #[allow(dead_code)] // API completeness
    async fn replace_state(&self, conv_id: &str, state: Option<ConvState>) -> Result<(), String> {
        match state {
            Some(state) => self.set_state(conv_id, state).await,
            None => self.clear_state(conv_id).await,
        }
    }
}

/// Outbound message delivery
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message into a conversation
    async fn send_message(&self, conv_id: &str, text: &str) -> Result<(), MessengerError>;
}

/// Combined storage trait for convenience
pub trait Storage: TaskStore + StateStore {}
impl<T: TaskStore + StateStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TaskStore + ?Sized> TaskStore for Arc<T> {
    async fn get_tasks(&self, conv_id: &str) -> Result<Vec<Task>, String> {
        (**self).get_tasks(conv_id).await
    }

    async fn save_tasks(&self, conv_id: &str, tasks: &[Task]) -> Result<(), String> {
        (**self).save_tasks(conv_id, tasks).await
    }

    async fn add_task(&self, conv_id: &str, description: &str) -> Result<Task, String> {
        (**self).add_task(conv_id, description).await
    }

    async fn delete_task(&self, conv_id: &str, number: i64) -> Result<bool, String> {
        (**self).delete_task(conv_id, number).await
    }

    async fn mark_done(&self, conv_id: &str, number: i64) -> Result<bool, String> {
        (**self).mark_done(conv_id, number).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn get_state(&self, conv_id: &str) -> Result<Option<ConvState>, String> {
        (**self).get_state(conv_id).await
    }

    async fn set_state(&self, conv_id: &str, state: ConvState) -> Result<(), String> {
        (**self).set_state(conv_id, state).await
    }

    async fn clear_state(&self, conv_id: &str) -> Result<(), String> {
        (**self).clear_state(conv_id).await
    }
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_message(&self, conv_id: &str, text: &str) -> Result<(), MessengerError> {
        (**self).send_message(conv_id, text).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl TaskStore for DatabaseStorage {
    async fn get_tasks(&self, conv_id: &str) -> Result<Vec<Task>, String> {
        self.db.get_tasks(conv_id).map_err(|e| e.to_string())
    }

    async fn save_tasks(&self, conv_id: &str, tasks: &[Task]) -> Result<(), String> {
        self.db.save_tasks(conv_id, tasks).map_err(|e| e.to_string())
    }

    async fn add_task(&self, conv_id: &str, description: &str) -> Result<Task, String> {
        self.db
            .add_task(conv_id, description)
            .map_err(|e| e.to_string())
    }

    async fn delete_task(&self, conv_id: &str, number: i64) -> Result<bool, String> {
        self.db
            .delete_task(conv_id, number)
            .map(|removed| removed.is_some())
            .map_err(|e| e.to_string())
    }

    async fn mark_done(&self, conv_id: &str, number: i64) -> Result<bool, String> {
        self.db.mark_done(conv_id, number).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn get_state(&self, conv_id: &str) -> Result<Option<ConvState>, String> {
        self.db.get_state(conv_id).map_err(|e| e.to_string())
    }

    async fn set_state(&self, conv_id: &str, state: ConvState) -> Result<(), String> {
        self.db.set_state(conv_id, state).map_err(|e| e.to_string())
    }

    async fn clear_state(&self, conv_id: &str) -> Result<(), String> {
        self.db
            .clear_state(conv_id)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
