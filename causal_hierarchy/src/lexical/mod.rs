//! Lexical signals - token overlap between transcript fragments.
//!
//! Two modes are supported:
//! - **plain**: Jaccard overlap `|A ∩ B| / |A ∪ B|`
//! - **idf**: the same ratio with every token weighted by inverse document
//!   frequency over the session corpus

mod corpus;

pub use corpus::*;

use std::collections::BTreeSet;

use crate::config::LexicalParams;

/// Ordered token set of one fragment.
pub type TokenSet = BTreeSet<String>;

/// Words too common in table talk to carry signal.
const STOPWORDS: &[&str] = &[
    "about", "again", "all", "and", "are", "but", "can", "could", "did", "does", "for", "from",
    "had", "has", "have", "her", "him", "his", "how", "into", "its", "just", "let", "like", "not",
    "now", "off", "one", "our", "out", "see", "she", "than", "that", "the", "their", "them",
    "then", "there", "they", "this", "was", "what", "when", "where", "which", "who", "why",
    "will", "with", "would", "yes", "you", "your",
];

/// Lowercased alphanumeric tokens of at least `min_len` chars, minus stopwords.
pub fn tokenize(text: &str, min_len: usize) -> TokenSet {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= min_len)
        .filter(|token| STOPWORDS.binary_search(token).is_err())
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of two token sets; 0 when either is empty.
pub fn lexical_overlap(a: &TokenSet, b: &TokenSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// Lexical scorer shared by every phase of one run.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    min_token_len: usize,
    corpus: Option<CorpusStats>,
}

impl LexicalScorer {
    /// Unweighted Jaccard scorer.
    pub fn plain(min_token_len: usize) -> Self {
        Self {
            min_token_len,
            corpus: None,
        }
    }

    /// IDF-weighted scorer over the given corpus.
    pub fn idf(min_token_len: usize, corpus: CorpusStats) -> Self {
        Self {
            min_token_len,
            corpus: Some(corpus),
        }
    }

    /// Build the scorer the parameters ask for from the session's documents.
    pub fn from_params<'a>(params: &LexicalParams, documents: impl IntoIterator<Item = &'a str>) -> Self {
        if params.idf_weighted {
            let corpus = CorpusStats::from_documents(documents, params.min_token_len);
            Self::idf(params.min_token_len, corpus)
        } else {
            Self::plain(params.min_token_len)
        }
    }

    pub fn tokenize(&self, text: &str) -> TokenSet {
        tokenize(text, self.min_token_len)
    }

    /// Overlap score in [0, 1].
    pub fn score(&self, a: &TokenSet, b: &TokenSet) -> f64 {
        match &self.corpus {
            Some(corpus) => corpus.idf_overlap(a, b),
            None => lexical_overlap(a, b),
        }
    }

    pub fn is_idf_weighted(&self) -> bool {
        self.corpus.is_some()
    }
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::plain(LexicalParams::default().min_token_len)
    }
}
