//! Operator notification sink.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Delivers a free-form text message to an operator chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, operator: &str, text: &str) -> Result<(), NotifyError>;
}
