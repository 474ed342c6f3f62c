//! Anneal phase - redistributes mass across a node set.
//!
//! Each node's mass becomes `mass_base + lambda * Σ strength_ll(i, j) * mass_prev(j)`
//! over its top-K neighbors by contribution. `mass_base` is never modified;
//! only the boost and the tier change. The phase is independent of extraction
//! and runs after every hierarchy round.

mod delta;

pub use delta::*;

use tracing::debug;

use crate::config::{AnnealParams, StrengthModel, TierThresholds};
use crate::evidence::{distance_score_hill, evidence, hill_lexical_strength, strength};
use crate::lexical::LexicalScorer;
use crate::model::{
    resolve_base_mass, resolve_center, resolve_mass, CausalLink, NeighborEdgeTrace, Phase,
};

/// Output of one anneal phase.
#[derive(Debug, Clone, Default)]
pub struct AnnealOutput {
    pub nodes: Vec<CausalLink>,
    /// One delta per node, in node order.
    pub deltas: Vec<MassDelta>,
    /// Top-K contributions of the final iteration.
    pub edges: Vec<NeighborEdgeTrace>,
}

/// Strength between two nodes under the configured model.
pub fn neighbor_strength(distance: f64, lexical: f64, params: &AnnealParams) -> f64 {
    let tau = params.decay.tau();
    match params.strength_model {
        StrengthModel::Hill => {
            hill_lexical_strength(distance, tau, params.decay.p, params.beta_lex_ll, lexical)
        }
        StrengthModel::Levers { gamma, scale } => {
            let distance_evidence = distance_score_hill(distance, tau, params.decay.p);
            strength(evidence(distance_evidence, lexical, 0.0), gamma, scale)
        }
    }
}

/// A neighbor inside the window of some target node.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    source: usize,
    distance: f64,
    lexical: f64,
    strength_ll: f64,
}

#[derive(Debug, Clone, Copy)]
struct Contribution {
    neighbor: Neighbor,
    contrib: f64,
}

/// Select the top-K contributions: contribution desc, distance asc, source ID asc.
fn top_contributions(
    neighbors: &[Neighbor],
    masses_prev: &[f64],
    ids: &[String],
    top_k: usize,
) -> Vec<Contribution> {
    let mut contributions: Vec<Contribution> = neighbors
        .iter()
        .map(|&neighbor| Contribution {
            neighbor,
            contrib: neighbor.strength_ll * masses_prev[neighbor.source].max(0.0),
        })
        .collect();

    contributions.sort_by(|a, b| {
        b.contrib
            .total_cmp(&a.contrib)
            .then_with(|| a.neighbor.distance.total_cmp(&b.neighbor.distance))
            .then_with(|| ids[a.neighbor.source].cmp(&ids[b.neighbor.source]))
    });
    contributions.truncate(top_k);
    contributions
}

/// Run the anneal phase over a node set.
pub fn anneal(
    mut nodes: Vec<CausalLink>,
    params: &AnnealParams,
    tiers: &TierThresholds,
    scorer: &LexicalScorer,
    round: u8,
) -> AnnealOutput {
    let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let centers: Vec<f64> = nodes.iter().map(resolve_center).collect();
    let bases: Vec<f64> = nodes.iter().map(resolve_base_mass).collect();
    let tokens: Vec<_> = nodes
        .iter()
        .map(|n| scorer.tokenize(&n.lexical_text()))
        .collect();

    let masses_before: Vec<f64> = nodes.iter().map(resolve_mass).collect();
    let tiers_before: Vec<_> = nodes.iter().map(|n| n.tier).collect();

    // Window membership and strengths are fixed; only masses move between iterations
    let neighbors: Vec<Vec<Neighbor>> = (0..nodes.len())
        .map(|target| {
            (0..nodes.len())
                .filter(|&source| source != target)
                .filter_map(|source| {
                    let distance = (centers[target] - centers[source]).abs();
                    if distance > params.window_links {
                        return None;
                    }
                    let lexical = scorer.score(&tokens[target], &tokens[source]);
                    Some(Neighbor {
                        source,
                        distance,
                        lexical,
                        strength_ll: neighbor_strength(distance, lexical, params),
                    })
                })
                .collect()
        })
        .collect();

    let mut masses_prev = masses_before.clone();
    let mut top: Vec<Vec<Contribution>> = vec![Vec::new(); nodes.len()];

    for _ in 0..params.iterations.max(1) {
        top = neighbors
            .iter()
            .map(|candidates| top_contributions(candidates, &masses_prev, &ids, params.top_k_contrib))
            .collect();

        for (target, node) in nodes.iter_mut().enumerate() {
            let summed: f64 = top[target].iter().map(|c| c.contrib).sum();
            node.set_mass(bases[target], (params.lambda * summed).max(0.0));
        }
        masses_prev = nodes.iter().map(resolve_mass).collect();
    }

    let mut deltas = Vec::with_capacity(nodes.len());
    let mut edges = Vec::new();

    for (target, node) in nodes.iter_mut().enumerate() {
        node.retier(tiers);

        for contribution in &top[target] {
            let neighbor = contribution.neighbor;
            edges.push(NeighborEdgeTrace {
                round,
                phase: Phase::Anneal,
                source_id: ids[neighbor.source].clone(),
                target_id: ids[target].clone(),
                strength_ll: neighbor.strength_ll,
                contrib: contribution.contrib,
                distance: neighbor.distance,
                lexical: neighbor.lexical,
            });
        }

        deltas.push(MassDelta {
            link_id: ids[target].clone(),
            mass_base: bases[target],
            mass_prev: masses_before[target],
            mass_new: resolve_mass(node),
            boost: node.mass_boost.unwrap_or(0.0),
            tier_prev: tiers_before[target],
            tier_new: node.tier,
            top_contributor_id: top[target].first().map(|c| ids[c.neighbor.source].clone()),
        });
    }

    debug!(
        round,
        nodes = nodes.len(),
        edges = edges.len(),
        retiered = deltas.iter().filter(|d| d.tier_prev != d.tier_new).count(),
        "anneal: mass redistributed"
    );

    AnnealOutput {
        nodes,
        deltas,
        edges,
    }
}
