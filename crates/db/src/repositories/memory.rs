use std::collections::HashMap;

use tokio::sync::RwLock;

use labquote_core::catalog::CatalogSnapshot;
use labquote_core::domain::offer::VendorOffer;
use labquote_core::domain::product::{CatalogProduct, Embedding, ProductId};

use super::{CatalogRepository, RepositoryError};

#[derive(Default)]
struct CatalogState {
    /// Insertion order doubles as listing order.
    products: Vec<CatalogProduct>,
    offers: Vec<VendorOffer>,
}

/// Catalog store for tests and embedded use; mirrors the SQL upsert semantics.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn load_snapshot(&self) -> Result<CatalogSnapshot, RepositoryError> {
        let state = self.state.read().await;
        Ok(CatalogSnapshot::new(state.products.clone(), state.offers.clone()))
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|product| &product.id == id).cloned())
    }

    async fn save_product(&self, product: CatalogProduct) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        match state.products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => state.products.push(product),
        }
        Ok(())
    }

    async fn save_offer(&self, offer: VendorOffer) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if !state.products.iter().any(|product| product.id == offer.product_id) {
            return Err(RepositoryError::Decode(format!(
                "offer references unknown product {}",
                offer.product_id
            )));
        }

        for existing in state.offers.iter_mut().filter(|existing| existing.vendor_id == offer.vendor_id) {
            existing.vendor_name = offer.vendor_name.clone();
        }
        match state.offers.iter_mut().find(|existing| {
            existing.product_id == offer.product_id && existing.vendor_id == offer.vendor_id
        }) {
            Some(existing) => *existing = offer,
            None => state.offers.push(offer),
        }
        Ok(())
    }

    async fn save_embedding(
        &self,
        product_id: &ProductId,
        embedding: &Embedding,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .iter_mut()
            .find(|product| &product.id == product_id)
            .ok_or_else(|| {
                RepositoryError::Decode(format!("embedding references unknown product {product_id}"))
            })?;
        product.embedding = Some(embedding.clone());
        Ok(())
    }
}

/// Builds a repository already holding `products` and `offers`, in order.
pub async fn seeded(
    products: Vec<CatalogProduct>,
    offers: Vec<VendorOffer>,
) -> Result<InMemoryCatalogRepository, RepositoryError> {
    let repository = InMemoryCatalogRepository::new();
    for product in products {
        repository.save_product(product).await?;
    }
    for offer in offers {
        repository.save_offer(offer).await?;
    }
    Ok(repository)
}
