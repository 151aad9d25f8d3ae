//! Error types for the tracker, store and panel.
//!
//! The CLI layer wraps these in `anyhow` with context; library code returns
//! [`Result`] directly.

use crate::browser::TabId;

#[derive(Debug, thiserror::Error)]
pub enum AutopsyError {
    /// A host browser call failed. Treated as transient by the panel.
    #[error("browser host error: {0}")]
    Host(String),

    #[error("tab not found: {0}")]
    TabNotFound(TabId),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutopsyError {
    pub fn host(message: impl Into<String>) -> Self {
        AutopsyError::Host(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AutopsyError>;
