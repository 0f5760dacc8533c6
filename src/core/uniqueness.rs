// src/core/uniqueness.rs
//
// Corpus of accepted embeddings and novelty scoring against it.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::analysis::Embedding;

/// Cosine similarity in `[-1, 1]`.
///
/// A zero-magnitude vector has no direction, so any comparison involving one
/// yields 0.0. Vectors of different length also yield 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Clamp to [-1, 1] to absorb rounding
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Embeddings of different lengths in one corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Embedding dimension {found} does not match corpus dimension {expected}")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub found: usize,
}

/// Append-only collection of accepted embeddings.
///
/// Entries are never removed or mutated; the only way in is [`Corpus::append`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    embeddings: Vec<Embedding>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, embedding: Embedding) {
        self.embeddings.push(embedding);
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Embedding> {
        self.embeddings.iter()
    }

    /// Embedding length, or `None` for an empty corpus. Errors when entries
    /// disagree.
    pub fn dimension(&self) -> Result<Option<usize>, DimensionMismatch> {
        let mut dims = self.embeddings.iter().map(Embedding::len);
        let first = match dims.next() {
            Some(first) => first,
            None => return Ok(None),
        };
        match dims.find(|&d| d != first) {
            Some(found) => Err(DimensionMismatch {
                expected: first,
                found,
            }),
            None => Ok(Some(first)),
        }
    }

    /// Load a corpus saved with [`Corpus::save`]; a missing file is an empty corpus
    pub fn load(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read(path)?;
        let corpus: Corpus = serde_json::from_slice(&data)?;
        debug!("Loaded {} embeddings from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(self)?;
        fs::write(path, data)
    }
}

impl From<Vec<Embedding>> for Corpus {
    fn from(embeddings: Vec<Embedding>) -> Self {
        Self { embeddings }
    }
}

/// Novelty of `embedding` against `corpus`, in `[0, 1]`.
///
/// An empty corpus gives exactly 1.0. Otherwise the result is
/// `1 - max cosine similarity`, clamped so that anti-correlated vectors
/// count as fully novel rather than exceeding 1.
pub fn uniqueness(embedding: &Embedding, corpus: &Corpus) -> f64 {
    if let Some(other) = corpus.iter().find(|e| e.len() != embedding.len()) {
        warn!(
            "Embedding of length {} compared with corpus entry of length {}; \
             mismatched entries count as dissimilar",
            embedding.len(),
            other.len()
        );
    }

    let max_similarity = corpus
        .iter()
        .map(|other| cosine_similarity(embedding.as_slice(), other.as_slice()))
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.max(s))));

    match max_similarity {
        None => 1.0,
        Some(similarity) => (1.0 - similarity).clamp(0.0, 1.0),
    }
}

/// Owns a corpus and scores new embeddings against it
#[derive(Debug, Clone, Default)]
pub struct UniquenessScorer {
    corpus: Corpus,
}

impl UniquenessScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corpus(corpus: Corpus) -> Self {
        Self { corpus }
    }

    pub fn uniqueness(&self, embedding: &Embedding) -> f64 {
        uniqueness(embedding, &self.corpus)
    }

    /// Admit an accepted embedding for future comparisons
    pub fn append(&mut self, embedding: Embedding) {
        self.corpus.append(embedding);
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn into_corpus(self) -> Corpus {
        self.corpus
    }
}
