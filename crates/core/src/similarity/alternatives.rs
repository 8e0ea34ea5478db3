//! Alternative discovery: same-category products ranked by similarity.

use tracing::{debug, warn};

use super::scoring::SimilarityScorer;
use super::types::SimilarityResult;
use super::DEFAULT_CANDIDATE_POOL;
use crate::domain::offer::VendorOffer;
use crate::domain::product::{CatalogProduct, ProductId};
use crate::errors::ApplicationError;
use crate::ports::{CatalogLookup, EmbeddingLookup, VendorOfferLookup};

pub struct AlternativeFinder<'a> {
    catalog: &'a dyn CatalogLookup,
    offers: &'a dyn VendorOfferLookup,
    embeddings: Option<&'a dyn EmbeddingLookup>,
    scorer: SimilarityScorer,
    candidate_pool: usize,
}

impl<'a> AlternativeFinder<'a> {
    pub fn new(catalog: &'a dyn CatalogLookup, offers: &'a dyn VendorOfferLookup) -> Self {
        Self {
            catalog,
            offers,
            embeddings: None,
            scorer: SimilarityScorer::new(),
            candidate_pool: DEFAULT_CANDIDATE_POOL,
        }
    }

    /// Source for embeddings that catalog entries do not carry themselves.
    pub fn with_embeddings(mut self, embeddings: &'a dyn EmbeddingLookup) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn with_scorer(mut self, scorer: SimilarityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_candidate_pool(mut self, candidate_pool: usize) -> Self {
        self.candidate_pool = candidate_pool;
        self
    }

    /// Up to `limit` alternatives for `product_id`, best first.
    ///
    /// An unknown or uncategorised reference yields an empty list. Only a
    /// failing catalog lookup is returned as an error.
    pub fn find_alternatives(
        &self,
        product_id: &ProductId,
        limit: usize,
    ) -> Result<Vec<SimilarityResult>, ApplicationError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let Some(mut reference) = self.catalog.product(product_id)? else {
            debug!(
                event_name = "engine.alternatives.reference_not_found",
                product_id = %product_id,
                "reference product not in catalog"
            );
            return Ok(Vec::new());
        };
        let Some(category) = reference.category.clone().filter(|value| !value.trim().is_empty())
        else {
            return Ok(Vec::new());
        };

        let mut embeddings = EmbeddingSource::new(self.embeddings);
        embeddings.hydrate(&mut reference);

        // One extra slot so the reference itself does not shrink the pool.
        let pool = self
            .catalog
            .by_category(&category, self.candidate_pool.saturating_add(1))?
            .into_iter()
            .filter(|candidate| candidate.id != reference.id)
            .take(self.candidate_pool);

        let minimum_score = self.scorer.thresholds().minimum_score;
        let mut scored = Vec::new();
        for mut candidate in pool {
            if reference.embedding.is_some() {
                embeddings.hydrate(&mut candidate);
            }
            let similarity = self.scorer.score(&reference, &candidate);
            if similarity.score > minimum_score {
                scored.push((candidate, similarity));
            }
        }

        // Stable: equal scores keep pool order.
        scored.sort_by(|(_, left), (_, right)| right.score.total_cmp(&left.score));
        scored.truncate(limit);

        let results = scored
            .into_iter()
            .map(|(product, similarity)| SimilarityResult {
                cheapest_offer: self.cheapest_offer(&product.id),
                product,
                score: similarity.score,
                reasons: similarity.reasons,
            })
            .collect::<Vec<_>>();

        debug!(
            event_name = "engine.alternatives.completed",
            product_id = %product_id,
            alternatives = results.len(),
            "alternatives ranked"
        );
        Ok(results)
    }

    fn cheapest_offer(&self, product_id: &ProductId) -> Option<VendorOffer> {
        match self.offers.offers_for(product_id) {
            Ok(offers) => cheapest(offers),
            Err(error) => {
                warn!(
                    event_name = "engine.alternatives.offers_unavailable",
                    product_id = %product_id,
                    error = %error,
                    "vendor offers unavailable; alternative reported without price"
                );
                None
            }
        }
    }
}

/// Lowest price wins; the earliest-listed offer wins on equal prices.
pub(crate) fn cheapest(offers: Vec<VendorOffer>) -> Option<VendorOffer> {
    offers.into_iter().fold(None, |best: Option<VendorOffer>, offer| match best {
        Some(current) if current.price <= offer.price => Some(current),
        _ => Some(offer),
    })
}

/// Embedding hydration for one lookup; the source is abandoned after its
/// first failure.
struct EmbeddingSource<'s> {
    lookup: Option<&'s dyn EmbeddingLookup>,
}

impl<'s> EmbeddingSource<'s> {
    fn new(lookup: Option<&'s dyn EmbeddingLookup>) -> Self {
        Self { lookup }
    }

    fn hydrate(&mut self, product: &mut CatalogProduct) {
        if product.embedding.is_some() {
            return;
        }
        let Some(lookup) = self.lookup else {
            return;
        };

        match lookup.embedding_for(&product.id) {
            Ok(embedding) => product.embedding = embedding,
            Err(error) => {
                warn!(
                    event_name = "engine.alternatives.embedding_unavailable",
                    product_id = %product.id,
                    error = %error,
                    "embedding source failed; semantic signal skipped for this lookup"
                );
                self.lookup = None;
            }
        }
    }
}
