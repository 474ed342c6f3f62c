//! Provenance records emitted next to the node sets.

use serde::{Deserialize, Serialize};

/// Pipeline phase that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Kernel,
    Anneal,
    Compose,
    Absorb,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Kernel => "kernel",
            Phase::Anneal => "anneal",
            Phase::Compose => "compose",
            Phase::Absorb => "absorb",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One neighbor's contribution to a node's mass boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborEdgeTrace {
    pub round: u8,
    pub phase: Phase,
    /// Node lending mass.
    pub source_id: String,
    /// Node receiving the boost.
    pub target_id: String,
    pub strength_ll: f64,
    pub contrib: f64,
    pub distance: f64,
    pub lexical: f64,
}

/// Which half of a link a fragment would have been.
/// A detected effect no cause claimed, offered to nearby links as context.
///
/// Unclaimed causes are not fragments: they stay in the node set as
/// singleton leaves and may become composite members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingletonNode {
    pub id: String,
    pub anchor_index: usize,
    pub text: String,
    /// Detected effect type.
    pub fragment_type: String,
    pub mass: f64,
}

impl SingletonNode {
    pub fn effect(
        anchor_index: usize,
        text: impl Into<String>,
        fragment_type: impl Into<String>,
        mass: f64,
    ) -> Self {
        Self {
            id: format!("effect:{anchor_index}"),
            anchor_index,
            text: text.into(),
            fragment_type: fragment_type.into(),
            mass,
        }
    }
}

/// Non-structural attachment of a singleton to a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEdge {
    pub round: u8,
    pub singleton_id: String,
    pub link_id: String,
    pub strength_ctx: f64,
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_ids() {
        let fragment = SingletonNode::effect(3, "A door opens", "narration", 1.0);
        assert_eq!(fragment.id, "effect:3");
        assert_eq!(fragment.anchor_index, 3);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Anneal.to_string(), "anneal");
        assert_eq!(serde_json::to_string(&Phase::Kernel).unwrap(), "\"kernel\"");
    }
}
