//! Per-identity dispatcher: one worker task per user.
//!
//! Messages from the same identity are handled strictly one at a time in
//! arrival order; different identities run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channels::IncomingMessage;
use crate::dialog::Identity;

use super::Bot;

/// A running per-identity worker.
struct Worker {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    handle: JoinHandle<()>,
}

/// Routes inbound messages to per-identity workers.
pub struct Dispatcher {
    bot: Arc<Bot>,
    workers: HashMap<Identity, Worker>,
}

impl Dispatcher {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self {
            bot,
            workers: HashMap::new(),
        }
    }

    /// Number of identities with a live worker.
    pub fn worker_count(&self) -> usize {
        self.workers
            .values()
            .filter(|worker| !worker.handle.is_finished())
            .count()
    }

    /// Queue a message on its identity's worker, spawning one if needed.
    pub fn dispatch(&mut self, message: IncomingMessage) {
        self.reap();
        let identity = Identity::new(message.user_id.as_str());

        let (message, previous) = match self.workers.remove(&identity) {
            Some(worker) => match worker.tx.send(message) {
                Ok(()) => {
                    self.workers.insert(identity, worker);
                    return;
                }
                // The worker went idle and closed its queue.
                Err(mpsc::error::SendError(message)) => (message, Some(worker.handle)),
            },
            None => (message, None),
        };

        let worker = spawn_worker(Arc::clone(&self.bot), identity.clone(), previous);
        if worker.tx.send(message).is_err() {
            tracing::error!(identity = %identity, "Fresh worker rejected message");
        }
        self.workers.insert(identity, worker);
    }

    /// Forget workers that have exited.
    fn reap(&mut self) {
        self.workers.retain(|_, worker| !worker.handle.is_finished());
    }

    /// Close every queue and wait for in-flight messages to finish.
    pub async fn shutdown(self) {
        for (identity, worker) in self.workers {
            drop(worker.tx);
            if let Err(e) = worker.handle.await {
                tracing::warn!(identity = %identity, "Worker ended abnormally: {}", e);
            }
        }
    }
}

/// Spawn a worker for `identity`.
///
/// The worker runs until the identity has no live conversation and its queue
/// is empty. It then closes the queue, handles anything that slipped in, and
/// exits; the next message spawns a fresh worker. A fresh worker first waits
/// for its `previous` one so messages stay in arrival order.
fn spawn_worker(bot: Arc<Bot>, identity: Identity, previous: Option<JoinHandle<()>>) -> Worker {
    let (tx, mut rx) = mpsc::unbounded_channel::<IncomingMessage>();
    let handle = tokio::spawn(async move {
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                tracing::warn!(identity = %identity, "Previous worker ended abnormally: {}", e);
            }
        }
        tracing::debug!(identity = %identity, "Worker started");

        while let Some(message) = rx.recv().await {
            let transition = bot.handle_message(&message).await;
            let idle = transition.stage.is_none_or(|stage| stage.is_terminal());
            if idle && rx.is_empty() {
                rx.close();
                while let Ok(message) = rx.try_recv() {
                    bot.handle_message(&message).await;
                }
                break;
            }
        }
        tracing::debug!(identity = %identity, "Worker stopped");
    });
    Worker { tx, handle }
}
