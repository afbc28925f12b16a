//! Validation errors for core documents.

/// Result alias for core validation.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building or parsing core documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Recurrence interval must be at least one
    #[error("recurrence interval must be positive, got {0}")]
    InvalidInterval(u32),

    /// Recurrence occurrence count must be at least one
    #[error("recurrence count must be positive")]
    InvalidCount,

    /// A string could not be parsed into an enum value
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        /// What was being parsed
        kind: &'static str,
        /// The rejected input
        value: String,
    },

    /// Empty task title
    #[error("task title must not be empty")]
    EmptyTitle,
}
