//! Link/link composer - builds the next hierarchy level.
//!
//! The composer works as follows:
//! 1. **Candidates**: for each node, the `k_local_links` nearest nodes strictly
//!    ahead of it by center, no further than `max_forward_lines`
//! 2. **Scoring**: distance and lexical evidence map to a strength, which must
//!    reach the mass-dependent merge threshold
//! 3. **Matching**: surviving pairs are sorted globally and accepted greedily
//!    while both endpoints are unused
//! 4. **Assembly**: accepted pairs become composites; the rest pass through

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LinkLinkParams, TierThresholds};
use crate::evidence::{distance_score_hill, evidence, merge_threshold, strength};
use crate::lexical::LexicalScorer;
use crate::model::{
    composite_link_id, resolve_center, resolve_mass, resolve_span, resolve_strength_internal,
    CausalLink, NodeKind,
};

/// A scored pair that cleared its merge threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    pub left_id: String,
    pub right_id: String,
    pub left_center: f64,
    pub distance: f64,
    pub lexical: f64,
    pub evidence: f64,
    pub strength: f64,
    pub threshold: f64,
}

/// Output of one composition round.
#[derive(Debug, Clone, Default)]
pub struct ComposeOutput {
    /// Composites and pass-through nodes, ordered by center then ID.
    pub nodes: Vec<CausalLink>,
    /// Accepted pairs in acceptance order.
    pub accepted: Vec<PairCandidate>,
    /// Pairs that cleared their threshold, accepted or not.
    pub candidates_above_threshold: usize,
    pub composites: usize,
    pub unpaired: usize,
}

/// Score one ordered pair; `None` when it falls short of the merge threshold.
pub fn score_pair(
    left: &CausalLink,
    right: &CausalLink,
    distance: f64,
    lexical: f64,
    params: &LinkLinkParams,
) -> Option<(f64, f64, f64)> {
    let distance_evidence = distance_score_hill(distance, params.decay.tau(), params.decay.p);
    let same_actor = matches!((&left.actor_id, &right.actor_id), (Some(a), Some(b)) if a == b);
    let boost = if same_actor { params.same_actor_boost } else { 0.0 };

    let evidence = evidence(distance_evidence, lexical, boost);
    let strength = strength(evidence, params.gamma, params.scale);
    let threshold = merge_threshold(resolve_mass(left), resolve_mass(right), params.t0, params.eta);

    (strength >= threshold).then_some((evidence, strength, threshold))
}

/// Join two nodes into the composite that replaces them at the next level.
///
/// The level rises only when neither child is an unclaimed singleton. Mass is
/// the sum of the children's masses; strength is not folded in.
pub fn build_composite(
    left: &CausalLink,
    right: &CausalLink,
    bridge: f64,
    tiers: &TierThresholds,
    created_at_ms: i64,
) -> CausalLink {
    let promote = !left.is_singleton() && !right.is_singleton();
    let child_level = left.level.max(right.level);
    let level = if promote { child_level + 1 } else { child_level };

    let (left_start, left_end) = resolve_span(left);
    let (right_start, right_end) = resolve_span(right);
    let effect_source = if right.effect_text.is_some() { right } else { left };

    let mut composite = CausalLink {
        id: composite_link_id(&left.id, &right.id),
        session_id: left.session_id.clone(),
        level,
        kind: NodeKind::Composite {
            members: [left.id.clone(), right.id.clone()],
        },
        actor_id: if left.actor_id == right.actor_id {
            left.actor_id.clone()
        } else {
            None
        },
        cause_text: left.cause_text.clone(),
        cause_type: left.cause_type.clone(),
        cause_anchor_index: left.cause_anchor_index,
        cause_mass: left.cause_mass,
        effect_text: effect_source.effect_text.clone(),
        effect_type: effect_source.effect_type.clone(),
        effect_anchor_index: effect_source.effect_anchor_index,
        effect_mass: effect_source.effect_mass,
        score: None,
        distance: None,
        claimed: left.claimed || right.claimed,
        span_start_index: Some(left_start.min(right_start)),
        span_end_index: Some(left_end.max(right_end)),
        center_index: Some((resolve_center(left) + resolve_center(right)) / 2.0),
        mass_base: None,
        mass_boost: None,
        mass: None,
        link_mass: None,
        strength_bridge: Some(bridge),
        strength_internal: Some(bridge),
        tier: Default::default(),
        created_at_ms,
    };
    composite.set_mass(resolve_mass(left) + resolve_mass(right), 0.0);
    composite.retier(tiers);
    composite
}

/// Re-stamp a node that found no partner: same level and causal/mass fields,
/// derived span/center/internal strength filled in.
pub fn pass_through(node: &CausalLink) -> CausalLink {
    let (start, end) = resolve_span(node);
    let mut unpaired = node.clone();
    unpaired.span_start_index = Some(start);
    unpaired.span_end_index = Some(end);
    unpaired.center_index = Some(resolve_center(node));
    unpaired.strength_internal = Some(resolve_strength_internal(node));
    unpaired
}

#[derive(Debug, Clone)]
struct Scored {
    left: usize,
    right: usize,
    candidate: PairCandidate,
}

/// Compose the next hierarchy level from a node set.
pub fn compose(
    nodes: &[CausalLink],
    params: &LinkLinkParams,
    tiers: &TierThresholds,
    scorer: &LexicalScorer,
    created_at_ms: i64,
) -> ComposeOutput {
    let centers: Vec<f64> = nodes.iter().map(resolve_center).collect();
    let tokens: Vec<_> = nodes
        .iter()
        .map(|n| scorer.tokenize(&n.lexical_text()))
        .collect();

    let mut scored: Vec<Scored> = Vec::new();

    for left in 0..nodes.len() {
        let mut forward: Vec<(usize, f64)> = (0..nodes.len())
            .filter(|&right| centers[right] > centers[left])
            .map(|right| (right, centers[right] - centers[left]))
            .filter(|&(_, distance)| distance <= params.max_forward_lines)
            .collect();

        forward.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| nodes[a.0].id.cmp(&nodes[b.0].id))
        });
        forward.truncate(params.k_local_links);

        for (right, distance) in forward {
            let lexical = scorer.score(&tokens[left], &tokens[right]);
            let Some((evidence, strength, threshold)) =
                score_pair(&nodes[left], &nodes[right], distance, lexical, params)
            else {
                continue;
            };

            scored.push(Scored {
                left,
                right,
                candidate: PairCandidate {
                    left_id: nodes[left].id.clone(),
                    right_id: nodes[right].id.clone(),
                    left_center: centers[left],
                    distance,
                    lexical,
                    evidence,
                    strength,
                    threshold,
                },
            });
        }
    }

    scored.sort_by(|a, b| {
        let (ca, cb) = (&a.candidate, &b.candidate);
        cb.strength
            .total_cmp(&ca.strength)
            .then_with(|| ca.distance.total_cmp(&cb.distance))
            .then_with(|| ca.left_center.total_cmp(&cb.left_center))
            .then_with(|| ca.left_id.cmp(&cb.left_id))
            .then_with(|| ca.right_id.cmp(&cb.right_id))
    });

    let candidates_above_threshold = scored.len();
    let mut used = vec![false; nodes.len()];
    let mut output_nodes = Vec::with_capacity(nodes.len());
    let mut accepted = Vec::new();

    for pair in scored {
        if used[pair.left] || used[pair.right] {
            continue;
        }
        used[pair.left] = true;
        used[pair.right] = true;

        output_nodes.push(build_composite(
            &nodes[pair.left],
            &nodes[pair.right],
            pair.candidate.strength,
            tiers,
            created_at_ms,
        ));
        accepted.push(pair.candidate);
    }

    let composites = output_nodes.len();
    output_nodes.extend(
        nodes
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(node, _)| pass_through(node)),
    );
    let unpaired = output_nodes.len() - composites;

    output_nodes.sort_by(|a, b| {
        resolve_center(a)
            .total_cmp(&resolve_center(b))
            .then_with(|| a.id.cmp(&b.id))
    });

    debug!(
        nodes_in = nodes.len(),
        candidates = candidates_above_threshold,
        composites,
        unpaired,
        "compose: level built"
    );

    ComposeOutput {
        nodes: output_nodes,
        accepted,
        candidates_above_threshold,
        composites,
        unpaired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(anchor: usize, text: &str) -> CausalLink {
        CausalLink::from_cause("s1", anchor, text, "action", 1.0)
            .with_effect(anchor, "", "narration", 1.0, 0.9, 1)
    }

    fn run(nodes: &[CausalLink], params: &LinkLinkParams) -> ComposeOutput {
        compose(
            nodes,
            params,
            &TierThresholds::default(),
            &LexicalScorer::default(),
            7,
        )
    }

    #[test]
    fn test_forward_window_pairs() {
        let nodes = vec![
            leaf(0, "alpha"),
            leaf(5, "bravo"),
            leaf(40, "charlie"),
            leaf(45, "delta"),
        ];
        let params = LinkLinkParams {
            max_forward_lines: 10.0,
            ..LinkLinkParams::default()
        };
        let output = run(&nodes, &params);

        assert_eq!(output.composites, 2);
        assert_eq!(output.unpaired, 0);
        assert_eq!(output.nodes.len(), 2);
        assert_eq!(output.nodes[0].id, format!("{}+{}", nodes[0].id, nodes[1].id));
        assert_eq!(output.nodes[1].id, format!("{}+{}", nodes[2].id, nodes[3].id));
        assert!(output.accepted.iter().all(|c| c.distance == 5.0));
    }

    #[test]
    fn test_composite_fields() {
        let left = leaf(2, "alpha").with_actor("pc-1");
        let right = CausalLink::from_cause("s1", 4, "bravo", "action", 1.0)
            .with_effect(6, "It breaks", "narration", 1.0, 0.9, 1)
            .with_actor("pc-1");
        let composite = build_composite(&left, &right, 0.8, &TierThresholds::default(), 7);

        assert_eq!(composite.level, 2);
        assert_eq!(composite.members().unwrap(), &[left.id.clone(), right.id.clone()]);
        assert_eq!(composite.span_start_index, Some(2));
        assert_eq!(composite.span_end_index, Some(6));
        assert_eq!(composite.center_index, Some(3.5));
        assert_eq!(composite.mass_base, Some(4.0));
        assert_eq!(composite.mass, Some(4.0));
        assert_eq!(composite.strength_bridge, Some(0.8));
        assert_eq!(composite.cause_anchor_index, 2);
        assert_eq!(composite.effect_anchor_index, Some(6));
        assert_eq!(composite.actor_id.as_deref(), Some("pc-1"));
        assert_eq!(composite.created_at_ms, 7);
    }

    #[test]
    fn test_singleton_child_blocks_promotion() {
        let left = leaf(2, "alpha");
        let right = CausalLink::from_cause("s1", 4, "bravo", "action", 1.0);
        let composite = build_composite(&left, &right, 0.8, &TierThresholds::default(), 0);

        assert_eq!(composite.level, 1);
        assert!(composite.is_composite());
        // Effect falls back to the left child when the right has none
        assert_eq!(composite.effect_anchor_index, left.effect_anchor_index);
    }

    #[test]
    fn test_never_pairs_backward() {
        let nodes = vec![leaf(10, "alpha"), leaf(10, "bravo")];
        let output = run(&nodes, &LinkLinkParams::default());

        // Equal centers are not strictly forward
        assert_eq!(output.composites, 0);
        assert_eq!(output.unpaired, 2);
    }

    #[test]
    fn test_heavy_pairs_resist_merging() {
        let mut left = leaf(0, "alpha");
        let mut right = leaf(3, "bravo");
        left.set_mass(500.0, 0.0);
        right.set_mass(500.0, 0.0);
        let output = run(&[left, right], &LinkLinkParams::default());

        assert_eq!(output.composites, 0);
        assert_eq!(output.candidates_above_threshold, 0);
    }

    #[test]
    fn test_greedy_prefers_strongest_pair() {
        // Middle node is closer to the right node; both pairs clear threshold
        let nodes = vec![leaf(0, "alpha"), leaf(6, "bravo"), leaf(8, "charlie")];
        let output = run(&nodes, &LinkLinkParams::default());

        assert_eq!(output.composites, 1);
        assert_eq!(output.unpaired, 1);
        assert_eq!(output.accepted[0].left_id, nodes[1].id);
        assert_eq!(output.accepted[0].right_id, nodes[2].id);
    }

    #[test]
    fn test_pass_through_preserves_fields() {
        let mut node = leaf(3, "alpha");
        node.span_start_index = None;
        node.center_index = None;
        node.strength_internal = None;

        let unpaired = pass_through(&node);
        assert_eq!(unpaired.cause_text, node.cause_text);
        assert_eq!(unpaired.effect_text, node.effect_text);
        assert_eq!(unpaired.mass, node.mass);
        assert_eq!(unpaired.mass_base, node.mass_base);
        assert_eq!(unpaired.level, node.level);
        assert_eq!(unpaired.span_start_index, Some(3));
        assert_eq!(unpaired.center_index, Some(3.0));
        assert_eq!(unpaired.strength_internal, Some(resolve_strength_internal(&node)));
    }

    #[test]
    fn test_same_actor_boost() {
        let a = leaf(0, "alpha").with_actor("pc-1");
        let b = leaf(4, "bravo").with_actor("pc-1");
        let c = leaf(4, "bravo").with_actor("pc-2");
        let params = LinkLinkParams::default();

        let (same, _, _) = score_pair(&a, &b, 4.0, 0.0, &params).unwrap();
        let (other, _, _) = score_pair(&a, &c, 4.0, 0.0, &params).unwrap();
        assert!((same - other - params.same_actor_boost).abs() < 1e-12);
    }
}
