//! The finished set of answers handed to the operator.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::conversation::{Conversation, Field, Identity};
use super::stage::Stage;

/// Immutable snapshot of a completed conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub identity: Identity,
    pub name: String,
    pub area: String,
    pub goal: String,
    pub mortgage: String,
    pub phone: String,
    pub completed_at: DateTime<Utc>,
}

impl Submission {
    /// Value of a single field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Area => &self.area,
            Field::Goal => &self.goal,
            Field::Mortgage => &self.mortgage,
            Field::Phone => &self.phone,
        }
    }

    /// Operator-facing summary: a header plus one labelled line per field.
    ///
    /// Answers are escaped so the operator sees exactly what the user typed.
    pub fn render(&self) -> String {
        let mut text = String::from("📩 *New request:*");
        for field in Field::ALL {
            text.push('\n');
            text.push_str(field.label());
            text.push_str(": ");
            text.push_str(&escape_markdown(self.get(field)));
        }
        text
    }
}

/// Escape the characters Telegram's legacy Markdown treats as markup.
fn escape_markdown(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl TryFrom<&Conversation> for Submission {
    type Error = String;

    fn try_from(conv: &Conversation) -> Result<Self, Self::Error> {
        if conv.stage() != Stage::Completed {
            return Err(format!(
                "Conversation for {} is {}, not completed",
                conv.identity(),
                conv.stage()
            ));
        }
        let take = |field: Field| {
            conv.get(field)
                .map(str::to_string)
                .ok_or_else(|| format!("Completed conversation is missing {}", field.key()))
        };
        Ok(Self {
            identity: conv.identity().clone(),
            name: take(Field::Name)?,
            area: take(Field::Area)?,
            goal: take(Field::Goal)?,
            mortgage: take(Field::Mortgage)?,
            phone: take(Field::Phone)?,
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed() -> Conversation {
        let mut conv = Conversation::new("42".into());
        for value in ["Anna", "Riverside", "For myself", "No", "+15551234567"] {
            conv.record(value).unwrap();
        }
        conv
    }

    #[test]
    fn snapshot_of_completed_conversation() {
        let sub = Submission::try_from(&completed()).unwrap();
        assert_eq!(sub.identity.as_str(), "42");
        assert_eq!(sub.name, "Anna");
        assert_eq!(sub.area, "Riverside");
        assert_eq!(sub.goal, "For myself");
        assert_eq!(sub.mortgage, "No");
        assert_eq!(sub.phone, "+15551234567");
    }

    #[test]
    fn incomplete_conversation_is_rejected() {
        let mut conv = Conversation::new("42".into());
        conv.record("Anna").unwrap();
        let err = Submission::try_from(&conv).unwrap_err();
        assert!(err.contains("awaiting_area"), "{err}");
    }

    #[test]
    fn render_lists_fields_in_stable_order() {
        let sub = Submission::try_from(&completed()).unwrap();
        let text = sub.render();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "📩 *New request:*",
                "👤 Name: Anna",
                "📍 Area: Riverside",
                "🎯 Goal: For myself",
                "💰 Mortgage: No",
                "📞 Phone: +15551234567",
            ]
        );
    }

    #[test]
    fn render_escapes_markup_in_answers() {
        let mut conv = Conversation::new("42".into());
        for value in ["_Anna_", "[x](http://example.com)", "*all*", "`No`", "+1555"] {
            conv.record(value).unwrap();
        }
        let text = Submission::try_from(&conv).unwrap().render();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "📩 *New request:*");
        assert_eq!(lines[1], r"👤 Name: \_Anna\_");
        assert_eq!(lines[2], r"📍 Area: \[x](http://example.com)");
        assert_eq!(lines[3], r"🎯 Goal: \*all\*");
        assert_eq!(lines[4], r"💰 Mortgage: \`No\`");
    }

    #[test]
    fn snapshot_keeps_raw_answers() {
        let mut conv = Conversation::new("42".into());
        for value in ["_Anna_", "Riverside", "For myself", "No", "+1555"] {
            conv.record(value).unwrap();
        }
        assert_eq!(Submission::try_from(&conv).unwrap().name, "_Anna_");
    }
}
