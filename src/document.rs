//! Checklist document provider.
//!
//! The checklist is a static artifact (usually a PDF) read from disk each time
//! a conversation completes, so replacing the file takes effect without a
//! restart.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::DocumentError;

/// An in-memory file ready to be sent to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Supplies the checklist artifact.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn fetch_checklist(&self) -> Result<Document, DocumentError>;
}

/// Reads the checklist from a file on disk.
pub struct FileChecklist {
    path: PathBuf,
}

impl FileChecklist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("checklist.pdf")
            .to_string()
    }
}

#[async_trait]
impl DocumentProvider for FileChecklist {
    async fn fetch_checklist(&self) -> Result<Document, DocumentError> {
        let path = self.path.display().to_string();
        let bytes = fs::read(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => DocumentError::NotFound { path: path.clone() },
            _ => DocumentError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            },
        })?;

        tracing::debug!(path = %path, size = bytes.len(), "Checklist loaded");
        Ok(Document {
            file_name: self.file_name(),
            bytes,
        })
    }
}
