//! Errors raised while building session inputs.

/// Session input errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid detector pattern for '{kind}': {source}")]
    InvalidPattern {
        kind: String,
        #[source]
        source: regex::Error,
    },

    #[error("actor '{id}' has an empty canonical name")]
    EmptyActorName { id: String },
}

pub type SessionResult<T> = Result<T, SessionError>;
