use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Canonical catalog seeds and their verification contract.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract {
        product_id: "prod-fbs-gibco",
        category: "Cell Culture",
        catalog_number: "16000-044",
        offer_count: 2,
        has_embedding: true,
        description: "Gibco FBS, reference serum for alternatives",
    },
    SeedProductContract {
        product_id: "prod-fbs-hyclone",
        category: "Cell Culture",
        catalog_number: "SH30919.03",
        offer_count: 1,
        has_embedding: true,
        description: "HyClone FBS, same grade competitor",
    },
    SeedProductContract {
        product_id: "prod-fbs-hi",
        category: "Cell Culture",
        catalog_number: "10082-147",
        offer_count: 1,
        has_embedding: true,
        description: "Heat-inactivated FBS, different grade",
    },
    SeedProductContract {
        product_id: "prod-dmem",
        category: "Cell Culture",
        catalog_number: "11965-092",
        offer_count: 1,
        has_embedding: true,
        description: "DMEM medium, same category different product",
    },
    SeedProductContract {
        product_id: "prod-pbs",
        category: "Cell Culture",
        catalog_number: "10010-023",
        offer_count: 2,
        has_embedding: false,
        description: "PBS with one offer lacking a lead time",
    },
    SeedProductContract {
        product_id: "prod-abc-kit",
        category: "Reagents",
        catalog_number: "ABC-100",
        offer_count: 2,
        has_embedding: false,
        description: "Reagent kit with a cheap slow and a dear fast offer",
    },
    SeedProductContract {
        product_id: "prod-abc-kit-bulk",
        category: "Reagents",
        catalog_number: "ABC-1000-B",
        offer_count: 1,
        has_embedding: false,
        description: "Bulk pack sharing the kit's catalog-number prefix",
    },
    SeedProductContract {
        product_id: "prod-ethanol",
        category: "Chemicals",
        catalog_number: "E7023",
        offer_count: 1,
        has_embedding: false,
        description: "Flammable solvent with hazard codes",
    },
];

const SEED_VENDOR_IDS: &[&str] = &["vendor-v1", "vendor-v2", "vendor-thermo", "vendor-sigma"];

/// Deterministic catalog dataset for integration tests and local demos.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    /// SQL fixture content for the catalog seed.
    pub const SQL: &'static str = include_str!("../../../config/fixtures/catalog_seed.sql");

    /// Load the seed dataset. Loading twice leaves the first load untouched.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::raw_sql(Self::SQL).execute(&mut *tx).await?;
        tx.commit().await?;

        let products_seeded = SEED_PRODUCTS
            .iter()
            .map(|product| ProductSeedInfo {
                product_id: product.product_id,
                category: product.category,
                description: product.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { products_seeded, vendors_seeded: SEED_VENDOR_IDS.len() })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let quoted_vendors = sql_array_from_ids(SEED_VENDOR_IDS);
        let vendor_count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(1) FROM vendor WHERE id IN {quoted_vendors}"))
                .fetch_one(pool)
                .await?;
        checks.push(("vendors", vendor_count == SEED_VENDOR_IDS.len() as i64));

        for product in SEED_PRODUCTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1 FROM catalog_product
                    WHERE id = ?1 AND category = ?2 AND catalog_number = ?3
                 )",
            )
            .bind(product.product_id)
            .bind(product.category)
            .bind(product.catalog_number)
            .fetch_one(pool)
            .await?;
            checks.push((product.product_id, exists == 1));

            let offer_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM vendor_offer WHERE product_id = ?1")
                    .bind(product.product_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((product.offer_label(), offer_count == product.offer_count));

            let embedding_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM product_embedding WHERE product_id = ?1")
                    .bind(product.product_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((product.embedding_label(), (embedding_count == 1) == product.has_embedding));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Clean up seeded fixtures from a test database.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let product_ids = SEED_PRODUCTS.iter().map(|product| product.product_id).collect::<Vec<_>>();
        let quoted_products = sql_array_from_ids(&product_ids);
        let quoted_vendors = sql_array_from_ids(SEED_VENDOR_IDS);

        sqlx::query(&format!("DELETE FROM product_embedding WHERE product_id IN {quoted_products}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM vendor_offer WHERE product_id IN {quoted_products}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM catalog_product WHERE id IN {quoted_products}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "DELETE FROM vendor WHERE id IN {quoted_vendors}
             AND NOT EXISTS (SELECT 1 FROM vendor_offer o WHERE o.vendor_id = vendor.id)"
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedProductContract {
    product_id: &'static str,
    category: &'static str,
    catalog_number: &'static str,
    offer_count: i64,
    has_embedding: bool,
    description: &'static str,
}

impl SeedProductContract {
    fn offer_label(&self) -> &'static str {
        match self.product_id {
            "prod-fbs-gibco" => "offers-fbs-gibco",
            "prod-pbs" => "offers-pbs",
            "prod-abc-kit" => "offers-abc-kit",
            _ => "offers-single-vendor",
        }
    }

    fn embedding_label(&self) -> &'static str {
        if self.has_embedding {
            "embedding-present"
        } else {
            "embedding-absent"
        }
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<ProductSeedInfo>,
    pub vendors_seeded: usize,
}

#[derive(Debug)]
pub struct ProductSeedInfo {
    pub product_id: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!CatalogSeedDataset::SQL.is_empty());
        for product in SEED_PRODUCTS {
            assert!(CatalogSeedDataset::SQL.contains(&format!("'{}'", product.product_id)));
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = CatalogSeedDataset::load(&pool).await.expect("load seed fixtures");
        let second = CatalogSeedDataset::load(&pool).await.expect("reload seed fixtures");
        assert_eq!(first.products_seeded.len(), SEED_PRODUCTS.len());
        assert_eq!(second.vendors_seeded, SEED_VENDOR_IDS.len());

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify seed");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        CatalogSeedDataset::load(&pool).await.expect("load seed fixtures");

        CatalogSeedDataset::clean(&pool).await.expect("clean seed fixtures");

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify seed");
        assert!(!verification.all_present);
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM catalog_product")
            .fetch_one(&pool)
            .await
            .expect("count products");
        assert_eq!(remaining, 0);
    }
}
