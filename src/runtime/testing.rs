//! Mock implementations for testing
//!
//! These mocks enable command and dispatcher testing without real I/O.

use super::traits::*;
use crate::db::{next_task_id, position_to_index, ConvState, Task};
use crate::messenger::MessengerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-Memory Storage
// ============================================================================

/// In-memory storage with the same range semantics as the SQLite store
pub struct InMemoryStorage {
    tasks: Mutex<HashMap<String, Vec<Task>>>,
    states: Mutex<HashMap<String, ConvState>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make `get_tasks` and `get_state` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every mutating call fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of stored tasks, bypassing failure injection
    pub fn tasks_of(&self, conv_id: &str) -> Vec<Task> {
        self.tasks
            .lock()
            .unwrap()
            .get(conv_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_read(&self) -> Result<(), String> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err("Injected read failure".to_string());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("Injected write failure".to_string());
        }
        Ok(())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryStorage {
    async fn get_tasks(&self, conv_id: &str) -> Result<Vec<Task>, String> {
        self.check_read()?;
        Ok(self.tasks_of(conv_id))
    }

    async fn save_tasks(&self, conv_id: &str, tasks: &[Task]) -> Result<(), String> {
        self.check_write()?;
        self.tasks
            .lock()
            .unwrap()
            .insert(conv_id.to_string(), tasks.to_vec());
        Ok(())
    }

    async fn add_task(&self, conv_id: &str, description: &str) -> Result<Task, String> {
        self.check_write()?;
        let mut tasks = self.tasks.lock().unwrap();
        let list = tasks.entry(conv_id.to_string()).or_default();
        let task = Task::new(next_task_id(list.len()), description);
        list.push(task.clone());
        Ok(task)
    }

    async fn delete_task(&self, conv_id: &str, number: i64) -> Result<bool, String> {
        self.check_write()?;
        let mut tasks = self.tasks.lock().unwrap();
        let Some(list) = tasks.get_mut(conv_id) else {
            return Ok(false);
        };
        match position_to_index(number, list.len()) {
            Some(index) => {
                list.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_done(&self, conv_id: &str, number: i64) -> Result<bool, String> {
        self.check_write()?;
        let mut tasks = self.tasks.lock().unwrap();
        let Some(list) = tasks.get_mut(conv_id) else {
            return Ok(false);
        };
        match position_to_index(number, list.len()) {
            Some(index) => {
                list[index].done = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl StateStore for InMemoryStorage {
    async fn get_state(&self, conv_id: &str) -> Result<Option<ConvState>, String> {
        self.check_read()?;
        Ok(self.states.lock().unwrap().get(conv_id).copied())
    }

    async fn set_state(&self, conv_id: &str, state: ConvState) -> Result<(), String> {
        self.check_write()?;
        self.states
            .lock()
            .unwrap()
            .insert(conv_id.to_string(), state);
        Ok(())
    }

    async fn clear_state(&self, conv_id: &str) -> Result<(), String> {
        self.check_write()?;
        self.states.lock().unwrap().remove(conv_id);
        Ok(())
    }
}

// ============================================================================
// Recording Messenger
// ============================================================================

/// Messenger that records every delivered message
pub struct RecordingMessenger {
    sent: Mutex<Vec<(String, String)>>,
    fail_sends: AtomicBool,
}

#[allow(dead_code)]
impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Delivered `(conversation_id, text)` pairs, oldest first
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Make every send fail with a network error
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, conv_id: &str, text: &str) -> Result<(), MessengerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(MessengerError::network("Injected send failure"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((conv_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_range_semantics() {
        let storage = InMemoryStorage::new();
        storage.add_task("c", "a").await.unwrap();
        storage.add_task("c", "b").await.unwrap();

        assert!(!storage.delete_task("c", 0).await.unwrap());
        assert!(!storage.delete_task("c", 3).await.unwrap());
        assert!(!storage.mark_done("c", -1).await.unwrap());
        assert!(!storage.mark_done("other", 1).await.unwrap());

        assert!(storage.delete_task("c", 1).await.unwrap());
        let remaining = storage.get_tasks("c").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].description, "b");
        assert_eq!(remaining[0].id, 2);

        // Ids come from the list length at append time
        let added = storage.add_task("c", "c").await.unwrap();
        assert_eq!(added.id, 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let storage = InMemoryStorage::new();
        storage.add_task("c", "a").await.unwrap();

        storage.fail_reads(true);
        assert!(storage.get_tasks("c").await.is_err());
        assert!(storage.get_state("c").await.is_err());
        assert!(storage.mark_done("c", 1).await.unwrap());
        storage.fail_reads(false);

        storage.fail_writes(true);
        assert!(storage.add_task("c", "b").await.is_err());
        assert!(storage.set_state("c", ConvState::AwaitingTaskToDelete).await.is_err());
        assert!(storage.clear_state("c").await.is_err());
        assert_eq!(storage.get_tasks("c").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recording_messenger() {
        let messenger = RecordingMessenger::new();
        messenger.send_message("c", "hello").await.unwrap();

        messenger.fail_sends(true);
        let err = messenger.send_message("c", "lost").await.unwrap_err();
        assert!(err.kind.is_retryable());

        assert_eq!(messenger.sent(), vec![("c".to_string(), "hello".to_string())]);
    }
}
