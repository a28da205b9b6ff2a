//! Dialog engine: the five-question checklist conversation.
//!
//! The conversation collects name, area, purchase goal and mortgage status as
//! free text, then insists on the user's phone number arriving through the
//! platform's share-contact action. Completing it yields two side effects for
//! the runtime: deliver the checklist, notify the operator.

pub mod conversation;
pub mod engine;
pub mod event;
pub mod prompts;
pub mod stage;
pub mod submission;

pub use conversation::{Conversation, ConversationStore, Field, Identity};
pub use engine::{DialogEngine, SideEffect, Step, Transition, step};
pub use event::InboundEvent;
pub use stage::Stage;
pub use submission::Submission;
