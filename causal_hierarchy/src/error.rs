//! Errors raised at the orchestrator boundary.
//!
//! The phases themselves are infallible; only configuration and
//! serialization can fail.

/// Causal hierarchy errors.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("max_level must be in 1..=3, got {max_level}")]
    InvalidMaxLevel { max_level: u8 },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("failed to parse hierarchy config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HierarchyError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;
