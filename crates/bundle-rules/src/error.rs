//! Rule construction errors.

/// Errors raised while building rules or rule tables.
///
/// These are composition errors: they surface before any asset is routed
/// and are never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("rule has no test pattern")]
    MissingPattern,

    #[error("test pattern is empty")]
    EmptyPattern,

    #[error("invalid test pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid path glob {glob:?}: {reason}")]
    InvalidGlob { glob: String, reason: String },

    #[error("rule {pattern:?} has no category")]
    MissingCategory { pattern: String },

    #[error("rule {pattern:?} has an empty transform chain")]
    EmptyChain { pattern: String },

    #[error("duplicate test pattern {0:?}")]
    DuplicatePattern(String),
}
