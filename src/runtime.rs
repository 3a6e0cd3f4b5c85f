//! Runtime for handling conversations
//!
//! Each active conversation gets one worker task fed by a bounded queue, so
//! messages for the same conversation are dispatched strictly one at a time
//! while different conversations proceed in parallel.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use crate::dispatcher::Dispatcher;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Queue depth per conversation worker
const WORKER_QUEUE_SIZE: usize = 32;

/// A message waiting for its conversation's worker
#[derive(Debug)]
pub struct InboundMessage {
    pub text: String,
    pub reply_tx: oneshot::Sender<String>,
}

/// Handle to a running conversation worker
#[derive(Clone)]
pub struct ConversationHandle {
    pub message_tx: mpsc::Sender<InboundMessage>,
    generation: u64,
}

type WorkerMap = Arc<RwLock<HashMap<String, ConversationHandle>>>;

/// Manager for all conversation workers
pub struct RuntimeManager {
    dispatcher: Arc<Dispatcher>,
    workers: WorkerMap,
    idle_timeout: Duration,
    next_generation: AtomicU64,
}

impl RuntimeManager {
    pub fn new(dispatcher: Arc<Dispatcher>, idle_timeout: Duration) -> Self {
        Self {
            dispatcher,
            workers: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
            next_generation: AtomicU64::new(1),
        }
    }

    /// Queue a message for its conversation and wait for the reply text
    pub async fn submit(&self, conversation_id: &str, text: &str) -> Result<String, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let mut message = InboundMessage {
            text: text.to_string(),
            reply_tx,
        };

        // A worker that retired between lookup and send refuses the message;
        // retry once on a fresh worker.
        for _ in 0..2 {
            let handle = self.get_or_create(conversation_id).await;
            match handle.message_tx.send(message).await {
                Ok(()) => {
                    return reply_rx
                        .await
                        .map_err(|e| format!("Worker dropped reply: {e}"));
                }
                Err(mpsc::error::SendError(returned)) => {
                    tracing::debug!(conv_id = %conversation_id, "Worker retired, restarting");
                    remove_worker(&self.workers, conversation_id, handle.generation).await;
                    message = returned;
                }
            }
        }

        Err(format!(
            "Failed to queue message for conversation {conversation_id}"
        ))
    }

    /// Get or create the worker for a conversation
    pub async fn get_or_create(&self, conversation_id: &str) -> ConversationHandle {
        // Check if already running
        {
            let workers = self.workers.read().await;
            if let Some(handle) = workers.get(conversation_id) {
                return handle.clone();
            }
        }

        let mut workers = self.workers.write().await;
        if let Some(handle) = workers.get(conversation_id) {
            return handle.clone();
        }

        let (message_tx, message_rx) = mpsc::channel(WORKER_QUEUE_SIZE);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = ConversationHandle {
            message_tx,
            generation,
        };
        workers.insert(conversation_id.to_string(), handle.clone());

        let worker = ConversationWorker {
            conversation_id: conversation_id.to_string(),
            generation,
            dispatcher: self.dispatcher.clone(),
            workers: self.workers.clone(),
            idle_timeout: self.idle_timeout,
        };
        tokio::spawn(worker.run(message_rx));

        tracing::debug!(conv_id = %conversation_id, generation, "Started conversation worker");
        handle
    }

    /// Number of live workers
    #[allow(dead_code)] // Used by tests
    pub async fn active_workers(&self) -> usize {
        self.workers.read().await.len()
    }
}

async fn remove_worker(workers: &WorkerMap, conversation_id: &str, generation: u64) {
    let mut workers = workers.write().await;
    if workers
        .get(conversation_id)
        .is_some_and(|h| h.generation == generation)
    {
        workers.remove(conversation_id);
    }
}

struct ConversationWorker {
    conversation_id: String,
    generation: u64,
    dispatcher: Arc<Dispatcher>,
    workers: WorkerMap,
    idle_timeout: Duration,
}

impl ConversationWorker {
    async fn run(self, mut message_rx: mpsc::Receiver<InboundMessage>) {
        loop {
            match tokio::time::timeout(self.idle_timeout, message_rx.recv()).await {
                Ok(Some(message)) => self.handle(message).await,
                Ok(None) => break,
                Err(_) => {
                    // Stop accepting, then finish whatever was already queued
                    message_rx.close();
                    while let Ok(message) = message_rx.try_recv() {
                        self.handle(message).await;
                    }
                    break;
                }
            }
        }

        remove_worker(&self.workers, &self.conversation_id, self.generation).await;
        tracing::debug!(conv_id = %self.conversation_id, "Conversation worker finished");
    }

    async fn handle(&self, message: InboundMessage) {
        let reply = self
            .dispatcher
            .handle_message(&self.conversation_id, &message.text)
            .await;
        let _ = message.reply_tx.send(reply);
    }
}
