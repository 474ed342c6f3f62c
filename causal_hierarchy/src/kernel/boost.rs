//! First-order neighbor boosting over freshly extracted links.

use crate::config::{KernelParams, TierThresholds};
use crate::evidence::hill_lexical_strength;
use crate::lexical::LexicalScorer;
use crate::model::{resolve_base_mass, resolve_center, CausalLink, NeighborEdgeTrace, Phase};

/// Add neighbor influence to every link's mass.
///
/// For each pair within `link_window` center distance, the target gains
/// `hill(d) * (1 + beta_lex_ll * lexical) * neighbor_mass * damping`. Sources
/// are restricted to claimed links when `require_claimed_neighbors` is set.
/// Contributions use base masses only, so the result does not depend on the
/// order links are visited in.
pub fn boost_link_masses(
    links: &mut [CausalLink],
    params: &KernelParams,
    tiers: &TierThresholds,
    scorer: &LexicalScorer,
) -> Vec<NeighborEdgeTrace> {
    let tau = params.decay.tau();
    let centers: Vec<f64> = links.iter().map(resolve_center).collect();
    let bases: Vec<f64> = links.iter().map(resolve_base_mass).collect();
    let tokens: Vec<_> = links.iter().map(|l| scorer.tokenize(&l.lexical_text())).collect();

    let mut boosts = vec![0.0; links.len()];
    let mut edges = Vec::new();

    for target in 0..links.len() {
        for source in 0..links.len() {
            if source == target {
                continue;
            }
            if params.require_claimed_neighbors && !links[source].claimed {
                continue;
            }

            let distance = (centers[target] - centers[source]).abs();
            if distance > params.link_window {
                continue;
            }

            let lexical = scorer.score(&tokens[target], &tokens[source]);
            let strength_ll =
                hill_lexical_strength(distance, tau, params.decay.p, params.beta_lex_ll, lexical);
            let contrib = strength_ll * bases[source].max(0.0) * params.damping;

            boosts[target] += contrib;
            edges.push(NeighborEdgeTrace {
                round: 1,
                phase: Phase::Kernel,
                source_id: links[source].id.clone(),
                target_id: links[target].id.clone(),
                strength_ll,
                contrib,
                distance,
                lexical,
            });
        }
    }

    for (link, (base, boost)) in links.iter_mut().zip(bases.into_iter().zip(boosts)) {
        link.set_mass(base, boost);
        link.retier(tiers);
    }

    edges
}
