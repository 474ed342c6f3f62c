//! Corpus statistics for IDF-weighted overlap.

use std::collections::BTreeMap;

use super::{tokenize, TokenSet};

/// Document frequencies over the lines of one session.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    documents: usize,
    document_frequency: BTreeMap<String, usize>,
}

impl CorpusStats {
    /// Count, for every token, how many documents contain it.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a str>, min_token_len: usize) -> Self {
        let mut stats = Self::default();
        for document in documents {
            stats.add_document(&tokenize(document, min_token_len));
        }
        stats
    }

    /// Record one tokenized document.
    pub fn add_document(&mut self, tokens: &TokenSet) {
        self.documents += 1;
        for token in tokens {
            *self.document_frequency.entry(token.clone()).or_default() += 1;
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn document_frequency(&self, token: &str) -> usize {
        self.document_frequency.get(token).copied().unwrap_or(0)
    }

    /// Smoothed inverse document frequency, always >= 1.
    pub fn idf(&self, token: &str) -> f64 {
        let n = self.documents as f64;
        let df = self.document_frequency(token) as f64;
        ((n + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// IDF-weighted Jaccard overlap in [0, 1].
    pub fn idf_overlap(&self, a: &TokenSet, b: &TokenSet) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let shared: f64 = a.intersection(b).map(|t| self.idf(t)).sum();
        let union: f64 = a.union(b).map(|t| self.idf(t)).sum();
        if union <= 0.0 {
            0.0
        } else {
            shared / union
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> CorpusStats {
        CorpusStats::from_documents(
            [
                "the goblin swings a rusty blade",
                "the goblin flees",
                "a silver key glints in the dust",
                "goblin laughter echoes",
            ],
            3,
        )
    }

    #[test]
    fn test_document_frequency() {
        let stats = corpus();
        assert_eq!(stats.document_count(), 4);
        assert_eq!(stats.document_frequency("goblin"), 3);
        assert_eq!(stats.document_frequency("key"), 1);
        assert_eq!(stats.document_frequency("dragon"), 0);
    }

    #[test]
    fn test_rare_tokens_weigh_more() {
        let stats = corpus();
        assert!(stats.idf("key") > stats.idf("goblin"));
        assert!(stats.idf("goblin") >= 1.0);
    }

    #[test]
    fn test_idf_overlap_prefers_rare_matches() {
        let stats = corpus();
        let common = stats.idf_overlap(
            &tokenize("goblin key", 3),
            &tokenize("goblin blade", 3),
        );
        let rare = stats.idf_overlap(
            &tokenize("goblin key", 3),
            &tokenize("silver key", 3),
        );
        assert!(rare > common);
    }

    #[test]
    fn test_idf_overlap_bounds() {
        let stats = corpus();
        let a = tokenize("silver key", 3);
        assert!((stats.idf_overlap(&a, &a) - 1.0).abs() < 1e-12);
        assert_eq!(stats.idf_overlap(&a, &TokenSet::new()), 0.0);
    }
}
