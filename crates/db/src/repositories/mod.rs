use async_trait::async_trait;
use thiserror::Error;

use labquote_core::catalog::CatalogSnapshot;
use labquote_core::domain::offer::VendorOffer;
use labquote_core::domain::product::{CatalogProduct, Embedding, ProductId};
use labquote_core::errors::ApplicationError;

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::{seeded as seeded_in_memory, InMemoryCatalogRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Persistent home of the catalog reference data the engine reads.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every product in listing order with its embedding, plus every offer.
    async fn load_snapshot(&self) -> Result<CatalogSnapshot, RepositoryError>;

    async fn find_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, RepositoryError>;

    /// Upserts the product. An attached embedding is stored alongside it; saving
    /// a product without one removes any stored embedding.
    async fn save_product(&self, product: CatalogProduct) -> Result<(), RepositoryError>;

    /// Upserts the offer keyed by (product, vendor), registering the vendor if new.
    async fn save_offer(&self, offer: VendorOffer) -> Result<(), RepositoryError>;

    async fn save_embedding(
        &self,
        product_id: &ProductId,
        embedding: &Embedding,
    ) -> Result<(), RepositoryError>;
}
