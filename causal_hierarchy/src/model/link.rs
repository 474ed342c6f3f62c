//! Causal link nodes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TierThresholds;

/// Stable ID of a leaf link: UUIDv5 of `"{session_id}:{cause_index}"`.
pub fn leaf_link_id(session_id: &str, cause_index: usize) -> String {
    let name = format!("{session_id}:{cause_index}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// ID of a composite node built from two children.
pub fn composite_link_id(left_id: &str, right_id: &str) -> String {
    format!("{left_id}+{right_id}")
}

/// Coarse narrative-size label derived from mass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Link,
    Beat,
    Event,
    Scene,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Link => "link",
            Tier::Beat => "beat",
            Tier::Event => "event",
            Tier::Scene => "scene",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural kind of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node_kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A leaf whose cause claimed an effect.
    Link,
    /// A leaf whose cause found no effect.
    Singleton,
    /// Two child nodes joined by the composer.
    Composite { members: [String; 2] },
}

/// A node of the causal hierarchy, at any level.
///
/// Derived fields are optional so that rows written by older schemas still
/// load; read them through the `resolve_*` functions rather than directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    pub id: String,
    pub session_id: String,

    /// Hierarchy depth (1 = leaf).
    pub level: u8,

    #[serde(flatten)]
    pub kind: NodeKind,

    /// Registered actor who spoke the cause.
    #[serde(default)]
    pub actor_id: Option<String>,

    pub cause_text: String,
    pub cause_type: String,
    pub cause_anchor_index: usize,
    #[serde(default)]
    pub cause_mass: Option<f64>,

    #[serde(default)]
    pub effect_text: Option<String>,
    #[serde(default)]
    pub effect_type: Option<String>,
    #[serde(default)]
    pub effect_anchor_index: Option<usize>,
    #[serde(default)]
    pub effect_mass: Option<f64>,

    /// Cause/effect score of the claim.
    #[serde(default)]
    pub score: Option<f64>,

    /// DM-turn distance between cause and claimed effect.
    #[serde(default)]
    pub distance: Option<usize>,

    /// Whether the cause claimed an effect.
    #[serde(default)]
    pub claimed: bool,

    #[serde(default)]
    pub span_start_index: Option<usize>,
    #[serde(default)]
    pub span_end_index: Option<usize>,
    #[serde(default)]
    pub center_index: Option<f64>,

    /// Intrinsic mass before neighbor boosting.
    #[serde(default)]
    pub mass_base: Option<f64>,
    /// Delta added by the latest boosting pass.
    #[serde(default)]
    pub mass_boost: Option<f64>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub link_mass: Option<f64>,

    /// Pairwise evidence between the two things just joined.
    #[serde(default)]
    pub strength_bridge: Option<f64>,
    /// Cumulative strength of everything folded into this node.
    #[serde(default)]
    pub strength_internal: Option<f64>,

    #[serde(default)]
    pub tier: Tier,

    #[serde(default)]
    pub created_at_ms: i64,
}

impl CausalLink {
    /// Create an unclaimed leaf for a detected cause.
    pub fn from_cause(
        session_id: impl Into<String>,
        cause_index: usize,
        cause_text: impl Into<String>,
        cause_type: impl Into<String>,
        cause_mass: f64,
    ) -> Self {
        let session_id = session_id.into();
        let mut link = Self {
            id: leaf_link_id(&session_id, cause_index),
            session_id,
            level: 1,
            kind: NodeKind::Singleton,
            actor_id: None,
            cause_text: cause_text.into(),
            cause_type: cause_type.into(),
            cause_anchor_index: cause_index,
            cause_mass: Some(cause_mass),
            effect_text: None,
            effect_type: None,
            effect_anchor_index: None,
            effect_mass: None,
            score: None,
            distance: None,
            claimed: false,
            span_start_index: Some(cause_index),
            span_end_index: Some(cause_index),
            center_index: Some(cause_index as f64),
            mass_base: None,
            mass_boost: None,
            mass: None,
            link_mass: None,
            strength_bridge: None,
            strength_internal: Some(0.0),
            tier: Tier::Link,
            created_at_ms: 0,
        };
        link.set_mass(cause_mass, 0.0);
        link
    }

    /// Claim an effect for this leaf.
    pub fn with_effect(
        mut self,
        effect_index: usize,
        effect_text: impl Into<String>,
        effect_type: impl Into<String>,
        effect_mass: f64,
        score: f64,
        distance: usize,
    ) -> Self {
        let cause_index = self.cause_anchor_index;
        let cause_mass = self.cause_mass.unwrap_or(0.0);

        self.kind = NodeKind::Link;
        self.claimed = true;
        self.effect_text = Some(effect_text.into());
        self.effect_type = Some(effect_type.into());
        self.effect_anchor_index = Some(effect_index);
        self.effect_mass = Some(effect_mass);
        self.score = Some(score);
        self.distance = Some(distance);
        self.span_start_index = Some(cause_index.min(effect_index));
        self.span_end_index = Some(cause_index.max(effect_index));
        self.center_index = Some((cause_index + effect_index) as f64 / 2.0);
        self.strength_internal = Some(score);
        self.set_mass(cause_mass + effect_mass, 0.0);
        self
    }

    /// Set the speaking actor.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at_ms: i64) -> Self {
        self.created_at_ms = created_at_ms;
        self
    }

    /// Write all mass fields at once so they cannot drift apart.
    pub fn set_mass(&mut self, base: f64, boost: f64) {
        let total = base + boost;
        self.mass_base = Some(base);
        self.mass_boost = Some(boost);
        self.mass = Some(total);
        self.link_mass = Some(total);
    }

    /// Recompute the tier from the current mass.
    pub fn retier(&mut self, tiers: &TierThresholds) {
        self.tier = tiers.classify(super::resolve_mass(self));
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, NodeKind::Composite { .. })
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self.kind, NodeKind::Singleton)
    }

    /// Child IDs of a composite.
    pub fn members(&self) -> Option<&[String; 2]> {
        match &self.kind {
            NodeKind::Composite { members } => Some(members),
            _ => None,
        }
    }

    /// Cause and effect text joined for lexical scoring.
    pub fn lexical_text(&self) -> String {
        match &self.effect_text {
            Some(effect) => format!("{} {}", self.cause_text, effect),
            None => self.cause_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resolve_mass;

    #[test]
    fn test_leaf_id_is_stable() {
        assert_eq!(leaf_link_id("s1", 4), leaf_link_id("s1", 4));
        assert_ne!(leaf_link_id("s1", 4), leaf_link_id("s1", 5));
        assert_ne!(leaf_link_id("s1", 4), leaf_link_id("s2", 4));
    }

    #[test]
    fn test_composite_id() {
        assert_eq!(composite_link_id("a", "b"), "a+b");
    }

    #[test]
    fn test_unclaimed_cause() {
        let link = CausalLink::from_cause("s1", 7, "I pick the lock", "action", 1.0);

        assert!(link.is_singleton());
        assert!(!link.claimed);
        assert_eq!(link.level, 1);
        assert_eq!(link.effect_text, None);
        assert_eq!(link.score, None);
        assert_eq!(link.span_start_index, Some(7));
        assert_eq!(link.center_index, Some(7.0));
        assert_eq!(resolve_mass(&link), 1.0);
    }

    #[test]
    fn test_claimed_link() {
        let link = CausalLink::from_cause("s1", 2, "I pick the lock", "action", 1.0)
            .with_effect(5, "The lock clicks open", "narration", 1.0, 0.8, 1)
            .with_actor("pc-1");

        assert_eq!(link.kind, NodeKind::Link);
        assert!(link.claimed);
        assert_eq!(link.span_start_index, Some(2));
        assert_eq!(link.span_end_index, Some(5));
        assert_eq!(link.center_index, Some(3.5));
        assert_eq!(link.mass_base, Some(2.0));
        assert_eq!(link.mass, link.link_mass);
        assert_eq!(link.strength_internal, Some(0.8));
        assert_eq!(link.actor_id.as_deref(), Some("pc-1"));
    }

    #[test]
    fn test_set_mass_keeps_fields_in_sync() {
        let mut link = CausalLink::from_cause("s1", 0, "I run", "action", 1.0);
        link.set_mass(2.0, 0.5);
        assert_eq!(link.mass_base, Some(2.0));
        assert_eq!(link.mass_boost, Some(0.5));
        assert_eq!(link.mass, Some(2.5));
        assert_eq!(link.link_mass, Some(2.5));
    }

    #[test]
    fn test_retier() {
        let mut link = CausalLink::from_cause("s1", 0, "I run", "action", 1.0);
        link.set_mass(3.0, 3.0);
        link.retier(&TierThresholds::default());
        assert_eq!(link.tier, Tier::Event);
    }

    #[test]
    fn test_node_kind_serialization() {
        let mut link = CausalLink::from_cause("s1", 0, "I run", "action", 1.0);
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["node_kind"], "singleton");
        assert!(json.get("members").is_none());

        link.kind = NodeKind::Composite {
            members: ["a".to_string(), "b".to_string()],
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["node_kind"], "composite");
        assert_eq!(json["members"][1], "b");

        let back: CausalLink = serde_json::from_value(json).unwrap();
        assert_eq!(back.members().unwrap()[0], "a");
    }

    #[test]
    fn test_lexical_text() {
        let link = CausalLink::from_cause("s1", 0, "I open the chest", "action", 1.0)
            .with_effect(1, "Gold spills out", "narration", 1.0, 0.9, 1);
        assert_eq!(link.lexical_text(), "I open the chest Gold spills out");
    }
}
