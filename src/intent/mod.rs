// Intent classification module
// Routes queries that semantic search cannot serve toward a keyword
// strategy, by scoring the query against embedded intent prototypes.

pub mod catalog;


use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::embeddings::EmbeddingProvider;

pub use catalog::default_catalog;

const COSINE_EPSILON: f32 = 1e-12;

/// A named category of user query, defined by example phrasings and the
/// keywords worth searching for when the category matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub id: String,
    pub name: String,
    pub examples: Vec<String>,
    pub keywords: Vec<String>,
}

/// Scores queries against a fixed intent catalog.
///
/// Each intent's prototype vector (the mean of its example embeddings) is
/// computed on first use and cached for the classifier's lifetime. The
/// cache is keyed by intent id and owned by this instance, so swapping the
/// catalog means building a new classifier with an empty cache; stale
/// prototypes cannot outlive the examples they were computed from.
pub struct IntentClassifier {
    embeddings: Arc<dyn EmbeddingProvider>,
    intents: Vec<Intent>,
    prototypes: Mutex<Option<HashMap<String, Vec<f32>>>>,
}

impl IntentClassifier {
    #[inline]
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, intents: Vec<Intent>) -> Self {
        Self {
            embeddings,
            intents,
            prototypes: Mutex::new(None),
        }
    }

    #[inline]
    pub fn with_default_catalog(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(embeddings, default_catalog())
    }

    #[inline]
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Score `query` against every intent with a prototype.
    ///
    /// Returns the best-scoring intent and its score, or `None` with
    /// negative infinity when no prototype is available. Ties keep the
    /// earliest intent in catalog order.
    #[inline]
    pub fn classify(&self, query: &str) -> Result<(Option<Intent>, f32)> {
        // Prototypes first: a cold cache does its remote calls before the
        // query embedding so a prototype failure is attributed correctly.
        self.ensure_prototypes()?;

        let query_embedding = self
            .embeddings
            .embed(query)
            .context("Failed to embed query for intent classification")?;

        let guard = self.lock_prototypes();
        let Some(prototypes) = guard.as_ref() else {
            return Ok((None, f32::NEG_INFINITY));
        };

        let mut best: Option<&Intent> = None;
        let mut best_score = f32::NEG_INFINITY;

        for intent in &self.intents {
            let Some(prototype) = prototypes.get(&intent.id) else {
                continue;
            };
            let score = cosine_similarity(&query_embedding, prototype);
            if score > best_score {
                best_score = score;
                best = Some(intent);
            }
        }

        debug!(
            "Detected intent {:?} with score {}",
            best.map(|i| i.id.as_str()),
            best_score
        );

        Ok((best.cloned(), best_score))
    }

    /// Compute and cache prototype vectors if not done yet. Holding the
    /// lock across the computation means concurrent cold-start callers
    /// wait instead of duplicating remote calls.
    fn ensure_prototypes(&self) -> Result<()> {
        let mut guard = self.lock_prototypes();
        if guard.is_some() {
            return Ok(());
        }

        let mut prototypes = HashMap::new();
        for intent in &self.intents {
            match self.compute_prototype(intent) {
                Ok(Some(prototype)) => {
                    prototypes.insert(intent.id.clone(), prototype);
                }
                Ok(None) => {
                    warn!("Intent {} has no examples, skipping", intent.id);
                }
                Err(e) => {
                    // One failed intent must not block the others.
                    warn!("Failed to compute prototype for intent {}: {}", intent.id, e);
                }
            }
        }

        debug!(
            "Computed {} intent prototypes for {} intents",
            prototypes.len(),
            self.intents.len()
        );

        *guard = Some(prototypes);
        Ok(())
    }

    fn compute_prototype(&self, intent: &Intent) -> Result<Option<Vec<f32>>> {
        if intent.examples.is_empty() {
            return Ok(None);
        }

        let embeddings = self
            .embeddings
            .embed_batch(&intent.examples)
            .with_context(|| format!("Failed to embed examples for intent {}", intent.id))?;

        Ok(mean_vector(&embeddings))
    }

    fn lock_prototypes(&self) -> MutexGuard<'_, Option<HashMap<String, Vec<f32>>>> {
        // Prototype computation cannot panic while holding the lock, so a
        // poisoned mutex only means another thread died elsewhere; the
        // cached data is still well-formed.
        self.prototypes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Component-wise mean of a set of equal-length vectors.
fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut mean = vec![0.0f32; first.len()];

    for vector in vectors {
        for (slot, value) in mean.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
    }

    let count = vectors.len() as f32;
    for slot in &mut mean {
        *slot /= count;
    }

    Some(mean)
}

/// Normalized dot product of two vectors, with a small epsilon guarding
/// the zero-vector case.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    dot / (norm_a * norm_b + COSINE_EPSILON)
}
