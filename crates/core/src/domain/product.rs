use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Fixed-length semantic vector produced by the external embedding store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity in [-1, 1], or `None` when the vectors cannot be
    /// compared (dimension mismatch, empty or zero-magnitude).
    pub fn cosine(&self, other: &Embedding) -> Option<f64> {
        if self.0.is_empty() || self.0.len() != other.0.len() {
            return None;
        }

        let mut dot = 0.0f64;
        let mut norm_left = 0.0f64;
        let mut norm_right = 0.0f64;
        for (left, right) in self.0.iter().zip(other.0.iter()) {
            let (left, right) = (f64::from(*left), f64::from(*right));
            dot += left * right;
            norm_left += left * left;
            norm_right += right * right;
        }

        let denominator = norm_left.sqrt() * norm_right.sqrt();
        if denominator == 0.0 {
            return None;
        }

        let cosine = dot / denominator;
        cosine.is_finite().then(|| cosine.clamp(-1.0, 1.0))
    }
}

/// Canonical catalog entry for a purchasable reagent or equipment item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub alternate_name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub catalog_number: Option<String>,
    pub specifications: BTreeMap<String, String>,
    pub grade: Option<String>,
    pub embedding: Option<Embedding>,
    pub hazard_codes: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogProduct {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProductId(id.into()),
            name: name.into(),
            alternate_name: None,
            brand: None,
            category: None,
            catalog_number: None,
            specifications: BTreeMap::new(),
            grade: None,
            embedding: None,
            hazard_codes: Vec::new(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    pub fn with_alternate_name(mut self, alternate_name: impl Into<String>) -> Self {
        self.alternate_name = Some(alternate_name.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_catalog_number(mut self, catalog_number: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog_number.into());
        self
    }

    pub fn with_specification(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.specifications.insert(key.into(), value.into());
        self
    }

    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(Embedding(embedding));
        self
    }

    pub fn with_hazard_code(mut self, code: impl Into<String>) -> Self {
        self.hazard_codes.push(code.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Names used for lexical matching: canonical name first, then the
    /// localized/alternate name when present.
    pub fn searchable_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alternate_name.as_deref())
    }

    pub fn shares_category_with(&self, other: &CatalogProduct) -> bool {
        match (self.category.as_deref(), other.category.as_deref()) {
            (Some(left), Some(right)) => left.trim().eq_ignore_ascii_case(right.trim()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogProduct, Embedding};

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let left = Embedding(vec![1.0, 2.0, 3.0]);
        let right = Embedding(vec![2.0, 4.0, 6.0]);

        let cosine = left.cosine(&right).expect("comparable vectors");
        assert!((cosine - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_rejects_dimension_mismatch_and_zero_vectors() {
        let left = Embedding(vec![1.0, 0.0]);

        assert_eq!(left.cosine(&Embedding(vec![1.0, 0.0, 0.0])), None);
        assert_eq!(left.cosine(&Embedding(vec![0.0, 0.0])), None);
        assert_eq!(Embedding(Vec::new()).cosine(&Embedding(Vec::new())), None);
    }

    #[test]
    fn searchable_names_include_alternate_name() {
        let product = CatalogProduct::new("p-1", "Fetal Bovine Serum").with_alternate_name("FBS");

        let names = product.searchable_names().collect::<Vec<_>>();
        assert_eq!(names, vec!["Fetal Bovine Serum", "FBS"]);
    }

    #[test]
    fn category_comparison_ignores_case_and_missing_values() {
        let serum = CatalogProduct::new("p-1", "Serum").with_category("Cell Culture");
        let media = CatalogProduct::new("p-2", "Media").with_category("cell culture ");
        let loose = CatalogProduct::new("p-3", "Loose");

        assert!(serum.shares_category_with(&media));
        assert!(!serum.shares_category_with(&loose));
        assert!(!loose.shares_category_with(&loose));
    }
}
