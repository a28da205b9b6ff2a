//! Conversation records and the in-memory store that holds them.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Opaque key identifying the user a conversation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A collected field. Ordering follows stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Area,
    Goal,
    Mortgage,
    Phone,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Area,
        Field::Goal,
        Field::Mortgage,
        Field::Phone,
    ];

    /// Map key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Area => "area",
            Self::Goal => "goal",
            Self::Mortgage => "mortgage",
            Self::Phone => "phone",
        }
    }

    /// Human label used in the operator summary.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "👤 Name",
            Self::Area => "📍 Area",
            Self::Goal => "🎯 Goal",
            Self::Mortgage => "💰 Mortgage",
            Self::Phone => "📞 Phone",
        }
    }
}

/// One user's run through the dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    identity: Identity,
    stage: Stage,
    fields: BTreeMap<Field, String>,
    started_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a fresh conversation at `AwaitingName`.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            stage: Stage::AwaitingName,
            fields: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Collected fields keyed by their map key, in stage order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.key(), value.as_str()))
            .collect()
    }

    /// Store the answer for the current stage and move to the next one.
    ///
    /// Returns the new stage, or an error naming the stage if it collects
    /// nothing (terminal stages).
    pub fn record(&mut self, value: impl Into<String>) -> Result<Stage, String> {
        let field = self
            .stage
            .field()
            .ok_or_else(|| format!("Stage {} does not collect a field", self.stage))?;
        let next = self
            .stage
            .next()
            .ok_or_else(|| format!("Stage {} has no successor", self.stage))?;
        if !self.stage.can_transition_to(next) {
            return Err(format!("Cannot transition from {} to {}", self.stage, next));
        }
        self.fields.insert(field, value.into());
        self.stage = next;
        Ok(next)
    }

    /// Move to `Cancelled`, discarding everything collected so far.
    pub fn cancel(&mut self) -> Result<(), String> {
        if !self.stage.can_transition_to(Stage::Cancelled) {
            return Err(format!("Cannot cancel from {}", self.stage));
        }
        self.fields.clear();
        self.stage = Stage::Cancelled;
        Ok(())
    }
}

/// In-flight conversations, at most one per identity.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<Identity, Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &Identity) -> Option<&Conversation> {
        self.conversations.get(identity)
    }

    /// Remove and return the conversation for `identity`.
    pub fn take(&mut self, identity: &Identity) -> Option<Conversation> {
        self.conversations.remove(identity)
    }

    /// Insert a conversation, replacing any previous one for the same identity.
    pub fn put(&mut self, conversation: Conversation) {
        self.conversations
            .insert(conversation.identity.clone(), conversation);
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
