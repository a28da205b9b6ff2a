//! Dialog engine: the pure transition function and its store wrapper.
//!
//! `step` maps `(conversation, event)` to the next conversation, the prompts
//! to send, and the side effects to run. It performs no I/O; the bot runtime
//! executes the returned effects.

use crate::channels::OutgoingResponse;

use super::conversation::{Conversation, ConversationStore, Identity};
use super::event::InboundEvent;
use super::prompts;
use super::stage::Stage;
use super::submission::Submission;

/// Work the runtime must do after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Send the checklist document to the user.
    DeliverChecklist,
    /// Forward the finished submission to the operator.
    NotifyOperator(Submission),
}

/// Output of a single transition.
#[derive(Debug, Clone)]
pub struct Step {
    /// Conversation after the event, `None` if there is none.
    pub conversation: Option<Conversation>,
    pub prompts: Vec<OutgoingResponse>,
    pub effects: Vec<SideEffect>,
}

impl Step {
    fn reply(conversation: Option<Conversation>, prompts: Vec<OutgoingResponse>) -> Self {
        Self {
            conversation,
            prompts,
            effects: Vec::new(),
        }
    }
}

/// Apply one event to the current conversation.
pub fn step(current: Option<Conversation>, event: &InboundEvent) -> Step {
    // Terminal conversations are never resumed.
    let current = current.filter(|c| !c.stage().is_terminal());

    match (current, event) {
        (previous, InboundEvent::Start { identity }) => {
            if let Some(prev) = previous {
                tracing::debug!(
                    identity = %identity,
                    stage = %prev.stage(),
                    "Discarding in-flight conversation on restart"
                );
            }
            Step::reply(
                Some(Conversation::new(identity.clone())),
                vec![prompts::greeting()],
            )
        }

        (Some(mut conv), InboundEvent::Cancel { .. }) => match conv.cancel() {
            Ok(()) => Step::reply(Some(conv), vec![prompts::cancelled()]),
            Err(e) => {
                tracing::warn!("Cancel rejected: {}", e);
                Step::reply(Some(conv), Vec::new())
            }
        },
        (None, InboundEvent::Cancel { .. }) => Step::reply(None, vec![prompts::nothing_to_cancel()]),

        (None, _) => Step::reply(None, vec![prompts::not_started()]),

        (Some(conv), event) if conv.stage() == Stage::AwaitingPhone => accept_contact(conv, event),

        (Some(conv), event) => accept_text(conv, event),
    }
}

/// Free-text stages: any non-empty text advances, anything else re-asks.
fn accept_text(mut conv: Conversation, event: &InboundEvent) -> Step {
    let stage = conv.stage();
    let answer = match event {
        InboundEvent::Text { text, .. } => Some(text.trim()).filter(|t| !t.is_empty()),
        _ => None,
    };

    let Some(answer) = answer else {
        tracing::debug!(
            identity = %conv.identity(),
            stage = %stage,
            event = event.kind(),
            "Input not accepted, asking again"
        );
        let prompts = prompts::question_for(stage).into_iter().collect();
        return Step::reply(Some(conv), prompts);
    };

    match conv.record(answer) {
        Ok(next) => {
            tracing::info!(identity = %conv.identity(), from = %stage, to = %next, "Stage advanced");
            let prompts = prompts::question_for(next).into_iter().collect();
            Step::reply(Some(conv), prompts)
        }
        Err(e) => {
            tracing::warn!(identity = %conv.identity(), "Failed to record answer: {}", e);
            Step::reply(Some(conv), Vec::new())
        }
    }
}

/// The phone gate: only the sender's own shared contact is accepted.
fn accept_contact(conv: Conversation, event: &InboundEvent) -> Step {
    let rejection = match event {
        InboundEvent::Contact {
            phone_number,
            owner: Some(owner),
            ..
        } if owner == conv.identity() => {
            return complete(conv, phone_number);
        }
        InboundEvent::Contact { .. } => prompts::foreign_contact_rejected(),
        InboundEvent::Text { text, .. } if !text.trim().is_empty() => prompts::contact_rejected(),
        _ => prompts::contact_required(),
    };

    tracing::debug!(
        identity = %conv.identity(),
        event = event.kind(),
        "Phone input rejected, contact share required"
    );
    Step::reply(Some(conv), vec![rejection, prompts::ask_contact()])
}

fn complete(mut conv: Conversation, phone_number: &str) -> Step {
    if let Err(e) = conv.record(phone_number) {
        tracing::warn!(identity = %conv.identity(), "Failed to record phone: {}", e);
        return Step::reply(Some(conv), vec![prompts::ask_contact()]);
    }

    match Submission::try_from(&conv) {
        Ok(submission) => {
            let elapsed = submission.completed_at - conv.started_at();
            tracing::info!(
                identity = %conv.identity(),
                elapsed_secs = elapsed.num_seconds(),
                "Conversation completed"
            );
            Step {
                conversation: Some(conv),
                prompts: Vec::new(),
                effects: vec![
                    SideEffect::DeliverChecklist,
                    SideEffect::NotifyOperator(submission),
                ],
            }
        }
        Err(e) => {
            tracing::error!(identity = %conv.identity(), "Completed without a full submission: {}", e);
            Step::reply(Some(conv), Vec::new())
        }
    }
}

/// Result of handling one event against a store.
#[derive(Debug, Clone)]
pub struct Transition {
    pub identity: Identity,
    /// Stage after the event; `None` when the identity has no conversation.
    pub stage: Option<Stage>,
    pub prompts: Vec<OutgoingResponse>,
    pub effects: Vec<SideEffect>,
}

/// Drives conversations held in a `ConversationStore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogEngine;

impl DialogEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply `event` to the identity's conversation in `store`.
    ///
    /// Conversations that reach a terminal stage are removed from the store.
    pub fn handle(&self, store: &mut ConversationStore, event: &InboundEvent) -> Transition {
        let identity = event.identity().clone();
        let current = store.take(&identity);
        let Step {
            conversation,
            prompts,
            effects,
        } = step(current, event);

        let stage = conversation.as_ref().map(Conversation::stage);
        if let Some(conv) = conversation {
            if !conv.stage().is_terminal() {
                store.put(conv);
            }
        }

        Transition {
            identity,
            stage,
            prompts,
            effects,
        }
    }
}
