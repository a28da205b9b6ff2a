//! Checklist bot. Collects a buyer's details over chat and sends them a
//! checklist.

pub mod bot;
pub mod channels;
pub mod config;
pub mod dialog;
pub mod document;
pub mod error;
pub mod health;
pub mod notify;
