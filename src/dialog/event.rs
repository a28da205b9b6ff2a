//! Inbound events the engine reacts to.

use crate::channels::IncomingMessage;

use super::conversation::Identity;

/// One inbound user event, tagged with the sender's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start`: begin (or restart) the dialog.
    Start { identity: Identity },
    /// Free-typed text.
    Text { identity: Identity, text: String },
    /// A contact shared through the platform's contact action.
    Contact {
        identity: Identity,
        phone_number: String,
        owner: Option<Identity>,
    },
    /// `/cancel`: abandon the dialog.
    Cancel { identity: Identity },
    /// Anything else: stickers, photos, unknown commands.
    Other { identity: Identity },
}

impl InboundEvent {
    pub fn identity(&self) -> &Identity {
        match self {
            Self::Start { identity }
            | Self::Text { identity, .. }
            | Self::Contact { identity, .. }
            | Self::Cancel { identity }
            | Self::Other { identity } => identity,
        }
    }

    /// Short event kind for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Text { .. } => "text",
            Self::Contact { .. } => "contact",
            Self::Cancel { .. } => "cancel",
            Self::Other { .. } => "other",
        }
    }

    /// Classify a channel message.
    ///
    /// A shared contact wins over any text. Slash commands accept a
    /// `@botname` suffix and trailing arguments (`/start ref123`).
    pub fn from_message(msg: &IncomingMessage) -> Self {
        let identity = Identity::new(msg.user_id.as_str());

        if let Some(contact) = &msg.contact {
            return Self::Contact {
                identity,
                phone_number: contact.phone_number.clone(),
                owner: contact.user_id.as_deref().map(Identity::from),
            };
        }

        let text = msg.content.trim();
        if let Some(command) = parse_command(text) {
            return match command {
                "start" => Self::Start { identity },
                "cancel" => Self::Cancel { identity },
                _ => Self::Other { identity },
            };
        }

        if text.is_empty() {
            return Self::Other { identity };
        }

        Self::Text {
            identity,
            text: msg.content.clone(),
        }
    }
}

/// Extract the command name from `/name@bot args`. Case-sensitive, like
/// Telegram's own command matching.
fn parse_command(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    if name.is_empty() { None } else { Some(name) }
}
