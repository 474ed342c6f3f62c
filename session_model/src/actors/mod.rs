//! Actor definitions - who is speaking in the transcript.

mod registry;

pub use registry::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A registered player character (or any speaker whose lines can be causes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorLike {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ActorLike {
    /// Create a new actor with no aliases.
    pub fn new(id: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            canonical_name: canonical_name.into(),
            aliases: Vec::new(),
        }
    }

    /// Add an alias for this actor.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Normalize a display name for matching: lowercase, alphanumerics only,
/// single spaces between words.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized display names of the dungeon master(s).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmSpeakers {
    names: BTreeSet<String>,
}

impl DmSpeakers {
    /// Build the set, normalizing every name.
    pub fn new<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Check whether a transcript author is a DM speaker.
    pub fn is_dm(&self, author_name: &str) -> bool {
        self.names.contains(&normalize_name(author_name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Sir  Aldric-the-Bold "), "sir aldric the bold");
        assert_eq!(normalize_name("DM"), "dm");
        assert_eq!(normalize_name("!!!"), "");
    }

    #[test]
    fn test_dm_speakers() {
        let dms = DmSpeakers::new(["Dungeon Master", "GM"]);
        assert!(dms.is_dm("dungeon   master"));
        assert!(dms.is_dm("gm"));
        assert!(!dms.is_dm("Mira"));
        assert_eq!(dms.len(), 2);
    }

    #[test]
    fn test_actor_builder() {
        let actor = ActorLike::new("pc-1", "Mira Stormwind").with_alias("Mira");
        assert_eq!(actor.aliases, vec!["Mira".to_string()]);
    }
}
