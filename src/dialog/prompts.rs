//! User-facing prompt texts.

use crate::channels::OutgoingResponse;

use super::stage::Stage;

/// Suggested answers for the purchase-goal question.
pub const GOAL_SUGGESTIONS: &[&str] = &["For myself", "For investment"];

/// Label of the share-contact button.
pub const SHARE_CONTACT_LABEL: &str = "📞 Share my number";

pub fn greeting() -> OutgoingResponse {
    OutgoingResponse::text(
        "👋 Hi! I'll send you a checklist for accepting your new apartment.\n\n\
         What's your name?",
    )
    .with_keyboard_removed()
}

pub fn ask_name() -> OutgoingResponse {
    OutgoingResponse::text("What's your name?")
}

pub fn ask_area() -> OutgoingResponse {
    OutgoingResponse::text("🗺️ Which area or residential complex are you buying in?")
}

pub fn ask_goal() -> OutgoingResponse {
    OutgoingResponse::text("🏠 Are you buying for yourself or as an investment?")
        .with_quick_replies(GOAL_SUGGESTIONS.iter().copied())
}

pub fn ask_mortgage() -> OutgoingResponse {
    OutgoingResponse::text("💸 Are you taking a mortgage?").with_keyboard_removed()
}

pub fn ask_contact() -> OutgoingResponse {
    OutgoingResponse::text(
        "📲 Please tap «Share my number» to send your phone number.\n\n\
         ✍️ Typed numbers are not accepted.",
    )
    .with_contact_request(SHARE_CONTACT_LABEL)
}

/// Warning sent before re-issuing the contact request.
pub fn contact_rejected() -> OutgoingResponse {
    OutgoingResponse::text("❗ Please don't type your number. Tap «Share my number» instead.")
}

/// Reminder for stickers, photos and other non-text input at the phone step.
pub fn contact_required() -> OutgoingResponse {
    OutgoingResponse::text("❗ Only the «Share my number» button works here.")
}

/// Warning for a contact that belongs to someone else.
pub fn foreign_contact_rejected() -> OutgoingResponse {
    OutgoingResponse::text(
        "❗ That contact isn't yours. Tap «Share my number» to send your own number.",
    )
}

pub fn cancelled() -> OutgoingResponse {
    OutgoingResponse::text("👌 Cancelled. Send /start whenever you want to begin again.")
        .with_keyboard_removed()
}

pub fn nothing_to_cancel() -> OutgoingResponse {
    OutgoingResponse::text("Nothing to cancel. Send /start to get your checklist.")
        .with_keyboard_removed()
}

/// Hint for messages that arrive outside any conversation.
pub fn not_started() -> OutgoingResponse {
    OutgoingResponse::text("Send /start to get your checklist.")
}

/// Sent right before the checklist document.
pub fn checklist_intro() -> OutgoingResponse {
    OutgoingResponse::text("✅ Thank you! Here is your apartment acceptance checklist.")
        .with_keyboard_removed()
}

/// Substitute for the document when it cannot be delivered.
pub fn checklist_unavailable() -> OutgoingResponse {
    OutgoingResponse::text(
        "😔 Sorry, the checklist is temporarily unavailable. Your details have been \
         received.",
    )
}

/// The question asked while waiting in `stage`.
///
/// Terminal stages ask nothing.
pub fn question_for(stage: Stage) -> Option<OutgoingResponse> {
    match stage {
        Stage::AwaitingName => Some(ask_name()),
        Stage::AwaitingArea => Some(ask_area()),
        Stage::AwaitingGoal => Some(ask_goal()),
        Stage::AwaitingMortgage => Some(ask_mortgage()),
        Stage::AwaitingPhone => Some(ask_contact()),
        Stage::Completed | Stage::Cancelled => None,
    }
}
