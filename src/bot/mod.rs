//! Bot runtime. Drives the dialog engine from a channel and runs the side
//! effects it returns.
//!
//! - `Bot::handle_message`: one inbound message: engine transition, prompts,
//!   then checklist delivery and operator notification on completion
//! - `Bot::run`: main loop feeding a per-identity `Dispatcher`

pub mod dispatcher;

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::channels::{Channel, IncomingMessage, OutgoingResponse};
use crate::dialog::{prompts, ConversationStore, DialogEngine, InboundEvent, SideEffect, Submission, Transition};
use crate::document::DocumentProvider;
use crate::error::Error;
use crate::notify::Notifier;

pub use dispatcher::Dispatcher;

/// External collaborators the bot talks to.
pub struct BotDeps {
    pub channel: Arc<dyn Channel>,
    pub documents: Arc<dyn DocumentProvider>,
    pub notifier: Arc<dyn Notifier>,
    /// Chat that receives finished submissions.
    pub operator_chat_id: String,
}

/// Checklist bot: owns the conversation store and executes side effects.
pub struct Bot {
    deps: BotDeps,
    engine: DialogEngine,
    store: Mutex<ConversationStore>,
}

impl Bot {
    pub fn new(deps: BotDeps, store: ConversationStore) -> Self {
        Self {
            deps,
            engine: DialogEngine::new(),
            store: Mutex::new(store),
        }
    }

    /// Number of conversations currently in flight.
    pub async fn active_conversations(&self) -> usize {
        self.store.lock().await.len()
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until the channel stream ends or Ctrl+C is received.
    pub async fn run(self: Arc<Self>) -> Result<(), Error> {
        let channel = Arc::clone(&self.deps.channel);
        let mut message_stream = channel.start().await?;
        let mut dispatcher = Dispatcher::new(Arc::clone(&self));

        tracing::info!(channel = channel.name(), "Checklist bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("Channel stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };
            dispatcher.dispatch(message);
        }

        dispatcher.shutdown().await;
        channel.shutdown().await?;
        Ok(())
    }

    // ── Message handling ────────────────────────────────────────────

    /// Handle one inbound message end to end.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Transition {
        let event = InboundEvent::from_message(message);

        let queued_ms = (Utc::now() - message.received_at).num_milliseconds();
        tracing::debug!(
            message_id = %message.id,
            identity = %event.identity(),
            user_name = message.user_name.as_deref().unwrap_or("-"),
            channel = %message.channel,
            event = event.kind(),
            queued_ms,
            "Received message"
        );

        // The lock covers only the pure transition, never channel I/O.
        let transition = {
            let mut store = self.store.lock().await;
            self.engine.handle(&mut store, &event)
        };

        for prompt in &transition.prompts {
            self.send(message, prompt.clone()).await;
        }

        for effect in &transition.effects {
            match effect {
                SideEffect::DeliverChecklist => self.deliver_checklist(message).await,
                SideEffect::NotifyOperator(submission) => self.notify_operator(submission).await,
            }
        }

        transition
    }

    async fn send(&self, message: &IncomingMessage, response: OutgoingResponse) {
        if let Err(e) = self.deps.channel.respond(message, response).await {
            tracing::warn!(user = %message.user_id, "Failed to send reply: {}", e);
        }
    }

    /// Send the checklist, or an apology if it can't be delivered.
    async fn deliver_checklist(&self, message: &IncomingMessage) {
        self.send(message, prompts::checklist_intro()).await;

        let result = match self.deps.documents.fetch_checklist().await {
            Ok(document) => {
                let file_name = document.file_name.clone();
                self.deps
                    .channel
                    .send_document(message, document)
                    .await
                    .map(|()| file_name)
                    .map_err(Error::from)
            }
            Err(e) => Err(Error::from(e)),
        };

        match result {
            Ok(file_name) => {
                tracing::info!(user = %message.user_id, file = %file_name, "Checklist delivered");
            }
            Err(e) => {
                tracing::error!(user = %message.user_id, "Failed to deliver checklist: {}", e);
                self.send(message, prompts::checklist_unavailable()).await;
            }
        }
    }

    /// Forward the submission to the operator. Never retried, never surfaced
    /// to the user.
    async fn notify_operator(&self, submission: &Submission) {
        let operator = &self.deps.operator_chat_id;
        match self.deps.notifier.notify(operator, &submission.render()).await {
            Ok(()) => {
                tracing::info!(identity = %submission.identity, operator = %operator, "Operator notified");
            }
            Err(e) => {
                tracing::error!(identity = %submission.identity, "Operator notification failed: {}", e);
            }
        }
    }
}
