//! Cause/effect classification oracle.
//!
//! The engine only needs a type label and a unit mass per line. Callers may
//! plug in any classifier through [`CauseDetector`] and [`EffectDetector`];
//! [`PatternDetector`] is the regex-backed default.

mod patterns;

pub use patterns::*;

use serde::{Deserialize, Serialize};

/// A positive classification of one transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detected cause or effect type (e.g. "attack", "narration").
    pub kind: String,
    /// Narrative weight of the line.
    pub mass: f64,
}

impl Detection {
    pub fn new(kind: impl Into<String>, mass: f64) -> Self {
        Self {
            kind: kind.into(),
            mass,
        }
    }
}

/// Classifies player lines that initiate an action or question.
pub trait CauseDetector {
    fn detect_cause(&self, text: &str) -> Option<Detection>;
}

/// Classifies DM lines that narrate a consequence.
pub trait EffectDetector {
    fn detect_effect(&self, text: &str) -> Option<Detection>;

    /// Whether the line reads as a direct yes/no answer.
    fn is_answer(&self, _text: &str) -> bool {
        false
    }
}
