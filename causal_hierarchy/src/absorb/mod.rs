//! Singleton absorption.
//!
//! Unclaimed effect fragments are attached to nearby links as context.
//! Context edges never change a link's members, level or mass.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::AbsorbParams;
use crate::evidence::hill_lexical_strength;
use crate::lexical::LexicalScorer;
use crate::model::{resolve_center, resolve_mass, CausalLink, ContextEdge, SingletonNode};

/// Result of one absorption pass.
#[derive(Debug, Clone, Default)]
pub struct AbsorbOutput {
    pub edges: Vec<ContextEdge>,
    /// Singletons left for the next round, in input order.
    pub unattached: Vec<SingletonNode>,
}

impl AbsorbOutput {
    pub fn attached_count(&self) -> usize {
        self.edges.len()
    }
}

/// Reach of a link: `radius_base + radius_per_mass * mass`.
pub fn absorb_radius(link_mass: f64, params: &AbsorbParams) -> f64 {
    params.radius_base + params.radius_per_mass * link_mass.max(0.0)
}

/// Number of singletons a link can hold: `floor(cap_base + cap_per_mass * mass)`.
pub fn absorb_capacity(link_mass: f64, params: &AbsorbParams) -> usize {
    let cap = (params.cap_base + params.cap_per_mass * link_mass.max(0.0)).floor();
    if cap.is_finite() && cap > 0.0 {
        cap as usize
    } else {
        0
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    singleton: usize,
    link: usize,
    strength: f64,
    distance: f64,
}

/// Attach singletons to links for one round.
///
/// Unclaimed leaves in `nodes` are not attachment targets. A pair is kept only
/// when its strength is strictly above `min_ctx_strength`.
pub fn absorb_singletons(
    singletons: &[SingletonNode],
    nodes: &[CausalLink],
    params: &AbsorbParams,
    scorer: &LexicalScorer,
    round: u8,
) -> AbsorbOutput {
    if !params.enabled || singletons.is_empty() {
        return AbsorbOutput {
            edges: Vec::new(),
            unattached: singletons.to_vec(),
        };
    }

    let links: Vec<&CausalLink> = nodes.iter().filter(|n| !n.is_singleton()).collect();
    let link_tokens: Vec<_> = links
        .iter()
        .map(|l| scorer.tokenize(&l.lexical_text()))
        .collect();
    let link_masses: Vec<f64> = links.iter().map(|l| resolve_mass(l)).collect();
    let tau = params.decay.tau();

    let mut candidates = Vec::new();
    for (s, singleton) in singletons.iter().enumerate() {
        let tokens = scorer.tokenize(&singleton.text);
        for (l, link) in links.iter().enumerate() {
            let distance = (singleton.anchor_index as f64 - resolve_center(link)).abs();
            if distance > absorb_radius(link_masses[l], params) {
                continue;
            }
            let lexical = scorer.score(&tokens, &link_tokens[l]);
            let strength =
                hill_lexical_strength(distance, tau, params.decay.p, params.beta_lex, lexical);
            if strength <= params.min_ctx_strength {
                continue;
            }
            candidates.push(Candidate {
                singleton: s,
                link: l,
                strength,
                distance,
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| singletons[b.singleton].mass.total_cmp(&singletons[a.singleton].mass))
            .then_with(|| a.distance.total_cmp(&b.distance))
            .then_with(|| singletons[a.singleton].id.cmp(&singletons[b.singleton].id))
            .then_with(|| links[a.link].id.cmp(&links[b.link].id))
    });

    let mut attached = vec![false; singletons.len()];
    let mut load: BTreeMap<usize, usize> = BTreeMap::new();
    let mut edges = Vec::new();

    for candidate in candidates {
        if attached[candidate.singleton] {
            continue;
        }
        let used = load.entry(candidate.link).or_insert(0);
        if *used >= absorb_capacity(link_masses[candidate.link], params) {
            continue;
        }
        *used += 1;
        attached[candidate.singleton] = true;

        edges.push(ContextEdge {
            round,
            singleton_id: singletons[candidate.singleton].id.clone(),
            link_id: links[candidate.link].id.clone(),
            strength_ctx: candidate.strength,
            distance: candidate.distance,
        });
    }

    let unattached: Vec<SingletonNode> = singletons
        .iter()
        .zip(&attached)
        .filter(|(_, attached)| !**attached)
        .map(|(singleton, _)| singleton.clone())
        .collect();

    debug!(
        round,
        singletons = singletons.len(),
        attached = edges.len(),
        unattached = unattached.len(),
        "absorb: context attached"
    );

    AbsorbOutput { edges, unattached }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(cause: usize, effect: usize, text: &str) -> CausalLink {
        CausalLink::from_cause("s1", cause, text, "action", 1.0)
            .with_effect(effect, "", "narration", 1.0, 0.9, 1)
    }

    fn run(singletons: &[SingletonNode], nodes: &[CausalLink], params: &AbsorbParams) -> AbsorbOutput {
        absorb_singletons(singletons, nodes, params, &LexicalScorer::default(), 1)
    }

    #[test]
    fn test_radius_and_capacity() {
        let params = AbsorbParams::default();
        assert_eq!(absorb_radius(2.0, &params), 5.0);
        assert_eq!(absorb_capacity(2.0, &params), 2);
        assert_eq!(absorb_capacity(0.9, &params), 1);
    }

    #[test]
    fn test_attach_nearby_fragment() {
        let nodes = vec![link(10, 11, "open the door")];
        let singletons = vec![SingletonNode::effect(12, "The door creaks", "narration", 0.6)];
        let output = run(&singletons, &nodes, &AbsorbParams::default());

        assert_eq!(output.attached_count(), 1);
        assert!(output.unattached.is_empty());
        let edge = &output.edges[0];
        assert_eq!(edge.singleton_id, "effect:12");
        assert_eq!(edge.link_id, nodes[0].id);
        assert_eq!(edge.distance, 1.5);
        assert_eq!(edge.round, 1);
    }

    #[test]
    fn test_out_of_radius_stays_unattached() {
        let nodes = vec![link(10, 11, "open the door")];
        let singletons = vec![SingletonNode::effect(40, "Far away", "narration", 0.6)];
        let output = run(&singletons, &nodes, &AbsorbParams::default());

        assert!(output.edges.is_empty());
        assert_eq!(output.unattached, singletons);
    }

    #[test]
    fn test_capacity_limits_attachments() {
        // Mass 2 gives capacity 2
        let nodes = vec![link(10, 10, "ritual")];
        let singletons = vec![
            SingletonNode::effect(9, "one", "narration", 0.5),
            SingletonNode::effect(11, "two", "narration", 0.5),
            SingletonNode::effect(12, "three", "narration", 0.5),
        ];
        let output = run(&singletons, &nodes, &AbsorbParams::default());

        assert_eq!(output.attached_count(), 2);
        assert_eq!(output.unattached.len(), 1);
        // The farthest fragment loses
        assert_eq!(output.unattached[0].id, "effect:12");
    }

    #[test]
    fn test_singleton_attaches_once() {
        let nodes = vec![link(10, 10, "alpha"), link(12, 12, "bravo")];
        let singletons = vec![SingletonNode::effect(11, "between", "narration", 0.5)];
        let output = run(&singletons, &nodes, &AbsorbParams::default());

        assert_eq!(output.attached_count(), 1);
        // Equal strength and distance; link id breaks the tie
        let expected = nodes.iter().map(|n| n.id.clone()).min().unwrap();
        assert_eq!(output.edges[0].link_id, expected);
    }

    #[test]
    fn test_unclaimed_leaves_are_not_targets() {
        let nodes = vec![CausalLink::from_cause("s1", 10, "I wave", "action", 1.0)];
        let singletons = vec![SingletonNode::effect(11, "Nothing", "narration", 0.5)];
        let output = run(&singletons, &nodes, &AbsorbParams::default());

        assert!(output.edges.is_empty());
    }

    #[test]
    fn test_strength_must_exceed_minimum() {
        let nodes = vec![link(10, 11, "open the door")];
        let singletons = vec![SingletonNode::effect(12, "The door creaks", "narration", 0.6)];
        let scorer = LexicalScorer::default();
        let defaults = AbsorbParams::default();
        let lexical = scorer.score(
            &scorer.tokenize(&singletons[0].text),
            &scorer.tokenize(&nodes[0].lexical_text()),
        );
        let exact = hill_lexical_strength(
            1.5,
            defaults.decay.tau(),
            defaults.decay.p,
            defaults.beta_lex,
            lexical,
        );

        let at_minimum = AbsorbParams {
            min_ctx_strength: exact,
            ..AbsorbParams::default()
        };
        assert!(run(&singletons, &nodes, &at_minimum).edges.is_empty());

        let below_minimum = AbsorbParams {
            min_ctx_strength: exact - 1e-9,
            ..AbsorbParams::default()
        };
        assert_eq!(run(&singletons, &nodes, &below_minimum).edges.len(), 1);
    }

    #[test]
    fn test_disabled_returns_everything() {
        let nodes = vec![link(10, 11, "open the door")];
        let singletons = vec![SingletonNode::effect(12, "The door creaks", "narration", 0.6)];
        let params = AbsorbParams {
            enabled: false,
            ..AbsorbParams::default()
        };
        let output = run(&singletons, &nodes, &params);

        assert!(output.edges.is_empty());
        assert_eq!(output.unattached.len(), 1);
    }
}
