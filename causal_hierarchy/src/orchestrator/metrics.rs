//! Per-phase distribution statistics.

use serde::{Deserialize, Serialize};

use crate::model::{resolve_mass, resolve_strength_internal, CausalLink, Phase};

/// Nearest-rank percentile of an ascending slice; `pct` in `[0, 1]`.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = ((pct.clamp(0.0, 1.0) * n as f64).ceil() as usize)
        .saturating_sub(1)
        .min(n - 1);
    sorted[rank]
}

/// min/p50/p90/max summary of a value set. Non-finite values are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub p50: f64,
    pub p90: f64,
    pub max: f64,
}

impl Distribution {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        Self {
            count: sorted.len(),
            min: sorted[0],
            p50: percentile(&sorted, 0.5),
            p90: percentile(&sorted, 0.9),
            max: sorted[sorted.len() - 1],
        }
    }
}

/// Statistics recorded after one phase of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub round: u8,
    pub phase: Phase,
    /// Nodes produced, or context edges for absorption.
    pub count: usize,
    pub mass: Distribution,
    pub strength: Distribution,
}

impl PhaseMetrics {
    /// Mass and internal-strength statistics over a node set.
    pub fn from_nodes(round: u8, phase: Phase, nodes: &[CausalLink]) -> Self {
        Self {
            round,
            phase,
            count: nodes.len(),
            mass: Distribution::from_values(nodes.iter().map(resolve_mass)),
            strength: Distribution::from_values(nodes.iter().map(resolve_strength_internal)),
        }
    }
}
