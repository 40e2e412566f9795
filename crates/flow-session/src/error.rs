//! Error types for the session core.
//!
//! Failures from the document engine are the only errors this crate
//! produces. Most entry points log them and carry on; only opening a
//! document ([`BookTab::render`](crate::BookTab::render)) hands them back.

use thiserror::Error;

/// Failure reported by the document engine collaborator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The document could not be opened.
    #[error("Failed to load document: {message}")]
    Load { message: String },

    /// A display, page-turn or resize request failed.
    #[error("Renderer failed to {operation}: {message}")]
    Render {
        operation: &'static str,
        message: String,
    },

    /// A selector could not be evaluated against section content.
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

impl EngineError {
    pub fn render(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Render {
            operation,
            message: message.into(),
        }
    }
}

/// Error returned when opening a document in a tab.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
