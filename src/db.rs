//! Database module for the to-do bot
//!
//! Provides persistence for task lists and conversation states. Every
//! mutation runs inside a single transaction, so a crash leaves either the
//! old or the new list on disk.

mod schema;

pub use schema::*;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // ==================== Task Operations ====================

    /// Get all tasks for a conversation, in insertion order
    pub fn get_tasks(&self, conversation_id: &str) -> DbResult<Vec<Task>> {
        let conn = self.conn()?;
        load_tasks(&conn, conversation_id)
    }

    /// Replace the full task list of a conversation
    pub fn save_tasks(&self, conversation_id: &str, tasks: &[Task]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        write_tasks(&tx, conversation_id, tasks)?;
        tx.commit()?;
        Ok(())
    }

    /// Append a task; its id is the list length after the append
    pub fn add_task(&self, conversation_id: &str, description: &str) -> DbResult<Task> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let len: i64 = tx.query_row(
            "SELECT COUNT(*) FROM tasks WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        let len = usize::try_from(len).unwrap_or_default();
        let task = Task::new(next_task_id(len), description);

        tx.execute(
            "INSERT INTO tasks (conversation_id, position, task_id, description, done)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![conversation_id, to_sql_position(len), task.id, task.description],
        )?;
        tx.commit()?;

        tracing::info!(conv_id = %conversation_id, description = %description, "Task added");
        Ok(task)
    }

    /// Remove the task at 1-based `number`. Returns the removed task, or
    /// `None` without touching the list when `number` is out of range.
    pub fn delete_task(&self, conversation_id: &str, number: i64) -> DbResult<Option<Task>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut tasks = load_tasks(&tx, conversation_id)?;
        let Some(index) = position_to_index(number, tasks.len()) else {
            tracing::warn!(conv_id = %conversation_id, number, "Invalid task number for deletion");
            return Ok(None);
        };

        let removed = tasks.remove(index);
        write_tasks(&tx, conversation_id, &tasks)?;
        tx.commit()?;

        tracing::info!(
            conv_id = %conversation_id,
            number,
            description = %removed.description,
            "Task deleted"
        );
        Ok(Some(removed))
    }

    /// Mark the task at 1-based `number` as done
    pub fn mark_done(&self, conversation_id: &str, number: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let len = load_tasks(&conn, conversation_id)?.len();
        let Some(index) = position_to_index(number, len) else {
            tracing::warn!(conv_id = %conversation_id, number, "Invalid task number for marking done");
            return Ok(false);
        };

        conn.execute(
            "UPDATE tasks SET done = 1 WHERE conversation_id = ?1 AND position = ?2",
            params![conversation_id, to_sql_position(index)],
        )?;

        tracing::info!(conv_id = %conversation_id, number, "Task marked done");
        Ok(true)
    }

    // ==================== State Operations ====================

    /// Get the pending follow-up state of a conversation.
    ///
    /// Records that no longer decode into a known state are treated as absent.
    pub fn get_state(&self, conversation_id: &str) -> DbResult<Option<ConvState>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT state FROM conversation_states WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|raw| {
            let state = ConvState::from_json(&raw);
            if state.is_none() {
                tracing::warn!(conv_id = %conversation_id, state = %raw, "Ignoring unknown conversation state");
            }
            state
        }))
    }

    /// Store or overwrite the state of a conversation
    pub fn set_state(&self, conversation_id: &str, state: ConvState) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO conversation_states (conversation_id, state, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(conversation_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![conversation_id, state.to_json(), Utc::now().to_rfc3339()],
        )?;

        tracing::info!(conv_id = %conversation_id, state = %state, "State set");
        Ok(())
    }

    /// Remove any state record. Returns whether one existed.
    pub fn clear_state(&self, conversation_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM conversation_states WHERE conversation_id = ?1",
            params![conversation_id],
        )?;

        if removed > 0 {
            tracing::info!(conv_id = %conversation_id, "State cleared");
        }
        Ok(removed > 0)
    }
}

fn load_tasks(conn: &Connection, conversation_id: &str) -> DbResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, description, done FROM tasks
         WHERE conversation_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![conversation_id], |row| {
        Ok(Task {
            id: row.get(0)?,
            description: row.get(1)?,
            done: row.get(2)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
}

fn write_tasks(conn: &Connection, conversation_id: &str, tasks: &[Task]) -> DbResult<()> {
    conn.execute(
        "DELETE FROM tasks WHERE conversation_id = ?1",
        params![conversation_id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO tasks (conversation_id, position, task_id, description, done)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (index, task) in tasks.iter().enumerate() {
        stmt.execute(params![
            conversation_id,
            to_sql_position(index),
            task.id,
            task.description,
            task.done,
        ])?;
    }
    Ok(())
}

/// Positions are stored 1-based
fn to_sql_position(index: usize) -> i64 {
    i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_tasks() {
        let db = Database::open_in_memory().unwrap();

        let first = db.add_task("conv-1", "buy milk").unwrap();
        let second = db.add_task("conv-1", "Walk The Dog").unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let tasks = db.get_tasks("conv-1").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].description, "buy milk");
        assert_eq!(tasks[1].description, "Walk The Dog");
        assert!(!tasks[1].done);

        assert!(db.get_tasks("conv-2").unwrap().is_empty());
    }

    #[test]
    fn test_delete_shifts_positions() {
        let db = Database::open_in_memory().unwrap();
        for desc in ["a", "b", "c"] {
            db.add_task("conv-1", desc).unwrap();
        }

        let removed = db.delete_task("conv-1", 2).unwrap().unwrap();
        assert_eq!(removed.description, "b");

        let tasks = db.get_tasks("conv-1").unwrap();
        assert_eq!(render_tasks(&tasks), "1. [ ] a\n2. [ ] c");
        // creation ids survive deletion
        assert_eq!(tasks[1].id, 3);

        // appended id is length + 1, so it can collide with a surviving id
        let added = db.add_task("conv-1", "d").unwrap();
        assert_eq!(added.id, 3);
    }

    #[test]
    fn test_delete_out_of_range_leaves_list() {
        let db = Database::open_in_memory().unwrap();
        db.add_task("conv-1", "a").unwrap();

        assert!(db.delete_task("conv-1", 0).unwrap().is_none());
        assert!(db.delete_task("conv-1", 2).unwrap().is_none());
        assert!(db.delete_task("conv-1", -3).unwrap().is_none());
        assert_eq!(db.get_tasks("conv-1").unwrap().len(), 1);
    }

    #[test]
    fn test_mark_done() {
        let db = Database::open_in_memory().unwrap();
        db.add_task("conv-1", "a").unwrap();
        db.add_task("conv-1", "b").unwrap();

        assert!(db.mark_done("conv-1", 2).unwrap());
        assert!(!db.mark_done("conv-1", 3).unwrap());

        let tasks = db.get_tasks("conv-1").unwrap();
        assert!(!tasks[0].done);
        assert!(tasks[1].done);
    }

    #[test]
    fn test_save_tasks_replaces_list() {
        let db = Database::open_in_memory().unwrap();
        db.add_task("conv-1", "old").unwrap();

        let replacement = vec![Task::new(1, "x"), Task::new(2, "y")];
        db.save_tasks("conv-1", &replacement).unwrap();
        assert_eq!(db.get_tasks("conv-1").unwrap(), replacement);

        db.save_tasks("conv-1", &[]).unwrap();
        assert!(db.get_tasks("conv-1").unwrap().is_empty());
    }

    #[test]
    fn test_state_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_state("conv-1").unwrap(), None);

        db.set_state("conv-1", ConvState::AwaitingTaskDescription).unwrap();
        db.set_state("conv-1", ConvState::AwaitingTaskToDelete).unwrap();
        assert_eq!(
            db.get_state("conv-1").unwrap(),
            Some(ConvState::AwaitingTaskToDelete)
        );
        assert_eq!(db.get_state("conv-2").unwrap(), None);

        assert!(db.clear_state("conv-1").unwrap());
        assert!(!db.clear_state("conv-1").unwrap());
        assert_eq!(db.get_state("conv-1").unwrap(), None);
    }

    #[test]
    fn test_unknown_state_reads_as_none() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .unwrap()
            .execute(
                "INSERT INTO conversation_states (conversation_id, state, updated_at)
                 VALUES ('conv-1', '{\"type\":\"awaiting_colour\"}', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        assert_eq!(db.get_state("conv-1").unwrap(), None);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo.db");

        {
            let db = Database::open(&path).unwrap();
            db.add_task("conv-1", "buy milk").unwrap();
            db.set_state("conv-1", ConvState::AwaitingTaskToMarkDone).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_tasks("conv-1").unwrap()[0].description, "buy milk");
        assert_eq!(
            db.get_state("conv-1").unwrap(),
            Some(ConvState::AwaitingTaskToMarkDone)
        );
    }
}
