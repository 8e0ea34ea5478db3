//! Trigram similarity in the style of PostgreSQL `pg_trgm`.
//!
//! Each word is padded with two leading spaces and one trailing space before
//! the three-character windows are collected, so word starts weigh more than
//! word endings. Similarity is the Jaccard ratio of the two trigram sets.

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::CatalogSnapshot;
use crate::ports::{FuzzyCandidate, FuzzyNameIndex, LookupError};
use crate::text::lexical_words;

pub type TrigramSet = HashSet<[char; 3]>;

pub fn trigrams(text: &str) -> TrigramSet {
    let mut set = TrigramSet::new();
    for word in lexical_words(text) {
        let padded = format!("  {word} ").chars().collect::<Vec<_>>();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }
    set
}

pub fn set_similarity(left: &TrigramSet, right: &TrigramSet) -> f64 {
    let shared = left.intersection(right).count();
    let union = left.len() + right.len() - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}

pub fn trigram_similarity(left: &str, right: &str) -> f64 {
    set_similarity(&trigrams(left), &trigrams(right))
}

struct IndexedProduct {
    position: usize,
    names: Vec<TrigramSet>,
}

/// In-process trigram index over a catalog snapshot's names and alternate names.
pub struct TrigramNameIndex {
    snapshot: Arc<CatalogSnapshot>,
    entries: Vec<IndexedProduct>,
}

impl TrigramNameIndex {
    pub fn build(snapshot: Arc<CatalogSnapshot>) -> Self {
        let entries = snapshot
            .products()
            .iter()
            .enumerate()
            .map(|(position, product)| IndexedProduct {
                position,
                names: product.searchable_names().map(trigrams).collect(),
            })
            .collect();

        Self { snapshot, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FuzzyNameIndex for TrigramNameIndex {
    fn best_match(
        &self,
        query: &str,
        vendor_hint: Option<&str>,
        threshold: f64,
    ) -> Result<Option<FuzzyCandidate>, LookupError> {
        let query = trigrams(query);
        if query.is_empty() {
            return Ok(None);
        }

        let products = self.snapshot.products();
        let mut best: Option<(usize, f64)> = None;
        for entry in &self.entries {
            let product = &products[entry.position];
            if let Some(hint) = vendor_hint {
                if !self.snapshot.in_vendor_scope(product, hint) {
                    continue;
                }
            }

            let similarity = entry
                .names
                .iter()
                .map(|name| set_similarity(&query, name))
                .fold(0.0f64, f64::max);

            // Strictly greater keeps the earliest-listed product on ties.
            if similarity >= threshold && best.map_or(true, |(_, score)| similarity > score) {
                best = Some((entry.position, similarity));
            }
        }

        Ok(best.map(|(position, similarity)| FuzzyCandidate {
            product: products[position].clone(),
            similarity,
        }))
    }
}

/// Stand-in used when fuzzy matching is switched off; every lookup reports
/// the index as unavailable so callers take their degraded path.
#[derive(Clone, Debug, Default)]
pub struct UnavailableFuzzyIndex {
    reason: String,
}

impl UnavailableFuzzyIndex {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl FuzzyNameIndex for UnavailableFuzzyIndex {
    fn best_match(
        &self,
        _query: &str,
        _vendor_hint: Option<&str>,
        _threshold: f64,
    ) -> Result<Option<FuzzyCandidate>, LookupError> {
        Err(LookupError::Unavailable { port: "fuzzy name index", reason: self.reason.clone() })
    }
}
