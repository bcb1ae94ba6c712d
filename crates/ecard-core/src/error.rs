//! Error types for the core crate
//!
//! The controller itself never fails. Errors only appear where text from
//! outside is turned into typed values:
//! - Field paths and section kinds parsed from strings
//! - Configuration files

/// Errors from parsing boundary input
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Dotted path names no editable field
    #[error("unknown field path: {0}")]
    UnknownFieldPath(String),

    /// Field name not valid for any child collection
    #[error("unknown child field: {0}")]
    UnknownChildField(String),

    /// Collection name is neither projects nor social
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// Section kind label not recognised
    #[error("unknown section kind: {0}")]
    UnknownSectionKind(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Check if the error came from parsing configuration
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
