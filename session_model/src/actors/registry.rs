//! Actor registry - resolves transcript authors to registered actors.

use super::{normalize_name, ActorLike};
use crate::error::{SessionError, SessionResult};

/// Lookup table from normalized names and aliases to actors.
#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: Vec<ActorLike>,

    /// (normalized key, actor index), longest key first.
    keys: Vec<(String, usize)>,
}

impl ActorRegistry {
    /// Create a registry from the given actors.
    pub fn new(actors: Vec<ActorLike>) -> SessionResult<Self> {
        let mut keys = Vec::new();

        for (idx, actor) in actors.iter().enumerate() {
            let canonical = normalize_name(&actor.canonical_name);
            if canonical.is_empty() {
                return Err(SessionError::EmptyActorName {
                    id: actor.id.clone(),
                });
            }
            keys.push((canonical, idx));

            for alias in &actor.aliases {
                let alias = normalize_name(alias);
                if !alias.is_empty() {
                    keys.push((alias, idx));
                }
            }
        }

        // Longest key wins; ties resolved by key text, then registration order
        keys.sort_by(|a, b| {
            b.0.len()
                .cmp(&a.0.len())
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        keys.dedup();

        Ok(Self { actors, keys })
    }

    /// Resolve an author display name to the actor whose name or alias is the
    /// longest substring of the normalized author name.
    pub fn match_author(&self, author_name: &str) -> Option<&ActorLike> {
        let author = normalize_name(author_name);
        if author.is_empty() {
            return None;
        }

        self.keys
            .iter()
            .find(|(key, _)| author.contains(key.as_str()))
            .map(|(_, idx)| &self.actors[*idx])
    }

    /// Get an actor by ID.
    pub fn get(&self, id: &str) -> Option<&ActorLike> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn actors(&self) -> &[ActorLike] {
        &self.actors
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ActorRegistry {
        ActorRegistry::new(vec![
            ActorLike::new("pc-al", "Al"),
            ActorLike::new("pc-alice", "Alice Vane").with_alias("Alice"),
            ActorLike::new("pc-bram", "Bram").with_alias("The Bard"),
        ])
        .unwrap()
    }

    #[test]
    fn test_longest_match_wins() {
        let registry = registry();

        // "al" is a substring too, but "alice" is longer
        let actor = registry.match_author("Alice (mobile)").unwrap();
        assert_eq!(actor.id, "pc-alice");
    }

    #[test]
    fn test_alias_match() {
        let registry = registry();
        let actor = registry.match_author("the bard").unwrap();
        assert_eq!(actor.id, "pc-bram");
    }

    #[test]
    fn test_no_match() {
        let registry = registry();
        assert!(registry.match_author("Dungeon Master").is_none());
        assert!(registry.match_author("   ").is_none());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = ActorRegistry::new(vec![ActorLike::new("pc-x", "  ")]);
        assert!(matches!(result, Err(SessionError::EmptyActorName { .. })));
    }

    #[test]
    fn test_get_by_id() {
        let registry = registry();
        assert_eq!(registry.get("pc-bram").unwrap().canonical_name, "Bram");
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 3);
    }
}
