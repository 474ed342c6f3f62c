//! Hierarchy configuration - every tunable of the pipeline with its default.
//!
//! All structs deserialize with `#[serde(default)]`, so a config file only
//! needs to name the values it overrides.

mod validate;

use serde::{Deserialize, Serialize};

use crate::error::HierarchyResult;
use crate::evidence::locality_to_tau;
use crate::model::Tier;

/// Highest hierarchy level the orchestrator will build.
pub const MAX_SUPPORTED_LEVEL: u8 = 3;

/// Complete parameter set for one hierarchy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyParams {
    /// Number of rounds to build (1 = leaf links only).
    pub max_level: u8,

    pub tiers: TierThresholds,
    pub lexical: LexicalParams,
    pub kernel: KernelParams,
    pub anneal: AnnealParams,
    pub link_links: LinkLinkParams,
    pub absorb: AbsorbParams,
}

impl Default for HierarchyParams {
    fn default() -> Self {
        Self {
            max_level: MAX_SUPPORTED_LEVEL,
            tiers: TierThresholds::default(),
            lexical: LexicalParams::default(),
            kernel: KernelParams::default(),
            anneal: AnnealParams::default(),
            link_links: LinkLinkParams::default(),
            absorb: AbsorbParams::default(),
        }
    }
}

impl HierarchyParams {
    /// Parse parameters from a TOML document.
    pub fn from_toml_str(source: &str) -> HierarchyResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Parse parameters from a JSON document.
    pub fn from_json_str(source: &str) -> HierarchyResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Canonical JSON rendering used for provenance hashing.
    pub fn to_canonical_json(&self) -> HierarchyResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Mass thresholds for the coarse narrative-size label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub beat: f64,
    pub event: f64,
    pub scene: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            beat: 2.5,
            event: 5.0,
            scene: 10.0,
        }
    }
}

impl TierThresholds {
    /// Map a mass to its tier.
    pub fn classify(&self, mass: f64) -> Tier {
        if mass >= self.scene {
            Tier::Scene
        } else if mass >= self.event {
            Tier::Event
        } else if mass >= self.beat {
            Tier::Beat
        } else {
            Tier::Link
        }
    }
}

/// Token-overlap settings shared by every phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalParams {
    /// Weight shared tokens by inverse document frequency over the transcript.
    pub idf_weighted: bool,

    /// Tokens shorter than this are ignored.
    pub min_token_len: usize,
}

impl Default for LexicalParams {
    fn default() -> Self {
        Self {
            idf_weighted: false,
            min_token_len: 3,
        }
    }
}

/// Hill distance-decay settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayParams {
    /// Single locality knob in [0, 1]; higher means faster decay.
    pub locality: f64,

    /// Explicit half-life, overriding `locality` when set.
    pub tau: Option<f64>,

    /// Hill exponent.
    pub p: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            locality: 0.5,
            tau: None,
            p: 2.0,
        }
    }
}

impl DecayParams {
    pub fn with_locality(locality: f64) -> Self {
        Self {
            locality,
            ..Self::default()
        }
    }

    /// Effective decay half-life.
    pub fn tau(&self) -> f64 {
        self.tau.unwrap_or_else(|| locality_to_tau(self.locality))
    }
}

/// How neighbor strength is computed during annealing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StrengthModel {
    /// `hill(d) * (1 + beta_lex_ll * lexical)`.
    #[default]
    Hill,
    /// `strength(evidence(hill(d), lexical), gamma, scale)`.
    Levers { gamma: f64, scale: f64 },
}

/// Leaf extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParams {
    /// DM turns considered after each cause.
    pub k_local: usize,

    pub decay: DecayParams,

    /// Lexical multiplier in cause/effect scoring.
    pub beta_lex: f64,

    /// Added when the candidate effect reads as a yes/no answer.
    pub answer_boost: f64,

    /// Causes at or above this mass use `strong_min_score`.
    pub strong_mass: f64,
    pub strong_min_score: f64,
    pub weak_min_score: f64,

    /// Replaces both mass-dependent thresholds when set.
    pub min_score_override: Option<f64>,

    /// Center-index window of the neighbor boosting pass.
    pub link_window: f64,

    /// Lexical multiplier in link/link boosting.
    pub beta_lex_ll: f64,

    pub damping: f64,

    /// Only claimed links may boost their neighbors.
    pub require_claimed_neighbors: bool,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            k_local: 8,
            decay: DecayParams::default(),
            beta_lex: 0.5,
            answer_boost: 0.15,
            strong_mass: 0.7,
            strong_min_score: 0.2,
            weak_min_score: 0.35,
            min_score_override: None,
            link_window: 12.0,
            beta_lex_ll: 0.5,
            damping: 0.1,
            require_claimed_neighbors: true,
        }
    }
}

impl KernelParams {
    /// Minimum cause/effect score a cause of the given mass must reach.
    pub fn threshold(&self, cause_mass: f64) -> f64 {
        if let Some(min_score) = self.min_score_override {
            return min_score;
        }
        if cause_mass >= self.strong_mass {
            self.strong_min_score
        } else {
            self.weak_min_score
        }
    }
}

/// Mass redistribution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealParams {
    /// Center-index window for neighbor candidates.
    pub window_links: f64,

    /// Only the strongest K contributions count.
    pub top_k_contrib: usize,

    /// Scale of the summed contribution.
    pub lambda: f64,

    /// Redistribution passes per phase.
    pub iterations: usize,

    pub decay: DecayParams,
    pub beta_lex_ll: f64,
    pub strength_model: StrengthModel,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self {
            window_links: 12.0,
            top_k_contrib: 4,
            lambda: 0.15,
            iterations: 1,
            decay: DecayParams::default(),
            beta_lex_ll: 0.5,
            strength_model: StrengthModel::Hill,
        }
    }
}

/// Link/link composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkLinkParams {
    /// Nearest forward partners considered per node.
    pub k_local_links: usize,

    /// Partners further ahead than this are never considered.
    pub max_forward_lines: f64,

    pub decay: DecayParams,

    /// Evidence exponent (<1 forgiving, >1 strict).
    pub gamma: f64,
    pub scale: f64,

    /// Base merge threshold.
    pub t0: f64,

    /// Growth resistance of the merge threshold.
    pub eta: f64,

    /// Evidence bonus when both nodes share an actor.
    pub same_actor_boost: f64,
}

impl Default for LinkLinkParams {
    fn default() -> Self {
        Self {
            k_local_links: 4,
            max_forward_lines: 24.0,
            decay: DecayParams::with_locality(0.25),
            gamma: 1.0,
            scale: 2.0,
            t0: 0.5,
            eta: 0.25,
            same_actor_boost: 0.05,
        }
    }
}

/// Singleton absorption settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorbParams {
    pub enabled: bool,

    /// Attachment radius is `radius_base + radius_per_mass * link_mass`.
    pub radius_base: f64,
    pub radius_per_mass: f64,

    pub decay: DecayParams,
    pub beta_lex: f64,
    pub min_ctx_strength: f64,

    /// Per-link capacity is `floor(cap_base + cap_per_mass * link_mass)`.
    pub cap_base: f64,
    pub cap_per_mass: f64,
}

impl Default for AbsorbParams {
    fn default() -> Self {
        Self {
            enabled: true,
            radius_base: 3.0,
            radius_per_mass: 1.0,
            decay: DecayParams::with_locality(0.75),
            beta_lex: 0.5,
            min_ctx_strength: 0.2,
            cap_base: 1.0,
            cap_per_mass: 0.5,
        }
    }
}
