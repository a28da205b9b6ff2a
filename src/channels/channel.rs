//! Channel trait and the message types that flow through it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::document::Document;
use crate::error::ChannelError;

/// Stream of inbound messages produced by a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A phone number shared through the platform's contact action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedContact {
    pub phone_number: String,
    /// Platform user the contact belongs to. `None` when the contact is not
    /// linked to a platform account (e.g. forwarded from an address book).
    pub user_id: Option<String>,
}

/// A message received from a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    pub channel: String,
    pub user_id: String,
    pub user_name: Option<String>,
    /// Message text. Empty for non-text messages.
    pub content: String,
    pub contact: Option<SharedContact>,
    /// Channel-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content: content.to_string(),
            contact: None,
            metadata: serde_json::json!({}),
            received_at: Utc::now(),
        }
    }

    pub fn with_contact(mut self, contact: SharedContact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }
}

/// Reply keyboard attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever keyboard the user has untouched.
    #[default]
    None,
    /// Suggested answers; the user may still type anything.
    QuickReplies(Vec<String>),
    /// A single button that shares the user's own contact.
    RequestContact(String),
    /// Hide any custom keyboard.
    Remove,
}

/// A message to send back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
    pub keyboard: Keyboard,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            keyboard: Keyboard::None,
        }
    }

    pub fn with_quick_replies<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyboard = Keyboard::QuickReplies(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_contact_request(mut self, label: impl Into<String>) -> Self {
        self.keyboard = Keyboard::RequestContact(label.into());
        self
    }

    pub fn with_keyboard_removed(mut self) -> Self {
        self.keyboard = Keyboard::Remove;
        self
    }
}

/// A chat transport: produces inbound messages and delivers replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Start listening and return the inbound message stream.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply to the chat `msg` came from.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Send a file to the chat `msg` came from.
    async fn send_document(
        &self,
        msg: &IncomingMessage,
        document: Document,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_message_builders() {
        let msg = IncomingMessage::new("telegram", "42", "")
            .with_contact(SharedContact {
                phone_number: "+15551234567".into(),
                user_id: Some("42".into()),
            })
            .with_metadata(serde_json::json!({"chat_id": "42"}))
            .with_user_name("Anna");

        assert_eq!(msg.channel, "telegram");
        assert_eq!(msg.user_name.as_deref(), Some("Anna"));
        assert_eq!(msg.metadata["chat_id"], "42");
        assert_eq!(
            msg.contact.as_ref().map(|c| c.phone_number.as_str()),
            Some("+15551234567")
        );
    }

    #[test]
    fn outgoing_response_keyboards() {
        let plain = OutgoingResponse::text("hi");
        assert_eq!(plain.keyboard, Keyboard::None);

        let quick = OutgoingResponse::text("goal?").with_quick_replies(["A", "B"]);
        assert_eq!(
            quick.keyboard,
            Keyboard::QuickReplies(vec!["A".into(), "B".into()])
        );

        let contact = OutgoingResponse::text("phone?").with_contact_request("Share");
        assert_eq!(contact.keyboard, Keyboard::RequestContact("Share".into()));

        let removed = OutgoingResponse::text("bye").with_keyboard_removed();
        assert_eq!(removed.keyboard, Keyboard::Remove);
    }
}
