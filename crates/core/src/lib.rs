pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod matching;
pub mod ports;
pub mod recommend;
pub mod similarity;
pub mod text;

pub use catalog::{CatalogSnapshot, TrigramNameIndex, UnavailableFuzzyIndex};
pub use domain::offer::{StockStatus, VendorId, VendorOffer};
pub use domain::product::{CatalogProduct, Embedding, ProductId};
pub use domain::purchase::PurchaseRecordInput;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use matching::{CatalogMatcher, MatchResult, MatchSettings, MatchTier};
pub use ports::{
    CatalogLookup, CatalogNumberMatch, EmbeddingLookup, FuzzyCandidate, FuzzyNameIndex,
    LookupError, VendorOfferLookup,
};
pub use recommend::{
    ConstrainedRecommender, DropReason, OptimizationParams, Recommendation, RecommendationBundle,
    RecommendationSettings, ScoredProduct,
};
pub use similarity::{
    AlternativeFinder, SimilarityReason, SimilarityResult, SimilarityScore, SimilarityScorer,
};
