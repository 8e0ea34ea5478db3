use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use labquote_core::catalog::CatalogSnapshot;
use labquote_core::domain::offer::{StockStatus, VendorId, VendorOffer};
use labquote_core::domain::product::{CatalogProduct, Embedding, ProductId};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.alternate_name, p.brand, p.category, \
     p.catalog_number, p.grade, p.specifications_json, p.hazard_codes_json, p.updated_at, \
     e.vector_json";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn load_snapshot(&self) -> Result<CatalogSnapshot, RepositoryError> {
        let products = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM catalog_product p
             LEFT JOIN product_embedding e ON e.product_id = p.id
             ORDER BY p.rowid"
        ))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(decode_product)
        .collect::<Result<Vec<_>, _>>()?;

        let offers = sqlx::query(
            "SELECT o.product_id, o.vendor_id, v.name AS vendor_name, o.price, o.currency,
                    o.lead_time_days, o.stock_status
             FROM vendor_offer o
             JOIN vendor v ON v.id = o.vendor_id
             ORDER BY o.id",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(decode_offer)
        .collect::<Result<Vec<_>, _>>()?;

        debug!(
            event_name = "db.catalog.snapshot_loaded",
            products = products.len(),
            offers = offers.len(),
            "catalog snapshot loaded"
        );
        Ok(CatalogSnapshot::new(products, offers))
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM catalog_product p
             LEFT JOIN product_embedding e ON e.product_id = p.id
             WHERE p.id = ?1"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_product).transpose()
    }

    async fn save_product(&self, product: CatalogProduct) -> Result<(), RepositoryError> {
        let specifications = encode_json(&product.specifications)?;
        let hazard_codes = encode_json(&product.hazard_codes)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO catalog_product (
                id, name, alternate_name, brand, category, catalog_number, grade,
                specifications_json, hazard_codes_json, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                alternate_name = excluded.alternate_name,
                brand = excluded.brand,
                category = excluded.category,
                catalog_number = excluded.catalog_number,
                grade = excluded.grade,
                specifications_json = excluded.specifications_json,
                hazard_codes_json = excluded.hazard_codes_json,
                updated_at = excluded.updated_at",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.alternate_name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.catalog_number)
        .bind(&product.grade)
        .bind(specifications)
        .bind(hazard_codes)
        .bind(product.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        match &product.embedding {
            Some(embedding) => {
                upsert_embedding(&mut tx, &product.id, embedding).await?;
            }
            None => {
                sqlx::query("DELETE FROM product_embedding WHERE product_id = ?1")
                    .bind(&product.id.0)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_offer(&self, offer: VendorOffer) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO vendor (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(&offer.vendor_id.0)
        .bind(&offer.vendor_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO vendor_offer (
                product_id, vendor_id, price, currency, lead_time_days, stock_status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(product_id, vendor_id) DO UPDATE SET
                price = excluded.price,
                currency = excluded.currency,
                lead_time_days = excluded.lead_time_days,
                stock_status = excluded.stock_status",
        )
        .bind(&offer.product_id.0)
        .bind(&offer.vendor_id.0)
        .bind(offer.price.to_string())
        .bind(&offer.currency)
        .bind(offer.lead_time_days.map(i64::from))
        .bind(offer.stock_status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save_embedding(
        &self,
        product_id: &ProductId,
        embedding: &Embedding,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        upsert_embedding(&mut tx, product_id, embedding).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn upsert_embedding(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    product_id: &ProductId,
    embedding: &Embedding,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO product_embedding (product_id, dimensions, vector_json, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(product_id) DO UPDATE SET
            dimensions = excluded.dimensions,
            vector_json = excluded.vector_json,
            updated_at = excluded.updated_at",
    )
    .bind(&product_id.0)
    .bind(embedding.dimensions() as i64)
    .bind(encode_json(&embedding.0)?)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|error| RepositoryError::Decode(error.to_string()))
}

fn decode_json<T: serde::de::DeserializeOwned>(
    raw: &str,
    column: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid {column}: {error}")))
}

fn decode_product(row: &SqliteRow) -> Result<CatalogProduct, RepositoryError> {
    let id = row.try_get::<String, _>("id")?;
    let specifications: BTreeMap<String, String> =
        decode_json(&row.try_get::<String, _>("specifications_json")?, "specifications_json")?;
    let hazard_codes: Vec<String> =
        decode_json(&row.try_get::<String, _>("hazard_codes_json")?, "hazard_codes_json")?;
    let embedding = row
        .try_get::<Option<String>, _>("vector_json")?
        .map(|raw| decode_json::<Vec<f32>>(&raw, "vector_json").map(Embedding))
        .transpose()?;
    let updated_at_raw = row.try_get::<String, _>("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid updated_at `{updated_at_raw}` for {id}: {error}"))
        })?;

    Ok(CatalogProduct {
        id: ProductId(id),
        name: row.try_get("name")?,
        alternate_name: row.try_get("alternate_name")?,
        brand: row.try_get("brand")?,
        category: row.try_get("category")?,
        catalog_number: row.try_get("catalog_number")?,
        specifications,
        grade: row.try_get("grade")?,
        embedding,
        hazard_codes,
        updated_at,
    })
}

fn decode_offer(row: &SqliteRow) -> Result<VendorOffer, RepositoryError> {
    let product_id = row.try_get::<String, _>("product_id")?;
    let price_raw = row.try_get::<String, _>("price")?;
    let price = Decimal::from_str(&price_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid price `{price_raw}` for {product_id}: {error}"))
    })?;
    let lead_time_days = row
        .try_get::<Option<i64>, _>("lead_time_days")?
        .map(|days| {
            u32::try_from(days).map_err(|_| {
                RepositoryError::Decode(format!("invalid lead time {days} for {product_id}"))
            })
        })
        .transpose()?;
    let stock_status = StockStatus::from_str(&row.try_get::<String, _>("stock_status")?)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    Ok(VendorOffer {
        product_id: ProductId(product_id),
        vendor_id: VendorId(row.try_get("vendor_id")?),
        vendor_name: row.try_get("vendor_name")?,
        price,
        currency: row.try_get("currency")?,
        lead_time_days,
        stock_status,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use labquote_core::domain::offer::{StockStatus, VendorOffer};
    use labquote_core::domain::product::{CatalogProduct, Embedding, ProductId};
    use labquote_core::ports::VendorOfferLookup;

    use super::SqlCatalogRepository;
    use crate::repositories::{CatalogRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn serum() -> CatalogProduct {
        CatalogProduct::new("prod-fbs", "Fetal Bovine Serum (500 mL)")
            .with_alternate_name("FBS")
            .with_brand("Gibco")
            .with_category("Cell Culture")
            .with_catalog_number("16000-044")
            .with_grade("Qualified")
            .with_specification("volume", "500 mL")
            .with_hazard_code("H317")
            .with_embedding(vec![0.1, 0.2, 0.3])
            .with_updated_at(Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn product_round_trips_with_embedding() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_product(serum()).await.expect("save");

        let loaded = repo
            .find_product(&ProductId::from("prod-fbs"))
            .await
            .expect("find")
            .expect("product exists");

        assert_eq!(loaded, serum());
        assert!(repo.find_product(&ProductId::from("missing")).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn resaving_keeps_listing_order_and_drops_detached_embedding() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_product(serum()).await.expect("save serum");
        repo.save_product(CatalogProduct::new("prod-pbs", "PBS")).await.expect("save pbs");

        let mut updated = serum();
        updated.name = "Fetal Bovine Serum, qualified".to_owned();
        updated.embedding = None;
        repo.save_product(updated).await.expect("update serum");

        let snapshot = repo.load_snapshot().await.expect("snapshot");
        let ids = snapshot.products().iter().map(|p| p.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["prod-fbs", "prod-pbs"]);
        assert_eq!(snapshot.products()[0].name, "Fetal Bovine Serum, qualified");
        assert_eq!(snapshot.embedding_count(), 0);
    }

    #[tokio::test]
    async fn offers_upsert_per_vendor_and_keep_vendor_names() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_product(serum()).await.expect("save");

        let offer = VendorOffer::new("prod-fbs", "vendor-thermo", Decimal::new(350_000, 0), Some(3))
            .with_vendor_name("Thermo Fisher Korea")
            .with_stock_status(StockStatus::InStock);
        repo.save_offer(offer.clone()).await.expect("save offer");
        let repriced = VendorOffer { price: Decimal::new(329_500, 0), lead_time_days: None, ..offer };
        repo.save_offer(repriced.clone()).await.expect("reprice offer");

        let snapshot = repo.load_snapshot().await.expect("snapshot");
        assert_eq!(snapshot.offer_count(), 1);
        let product = snapshot.find(&ProductId::from("prod-fbs")).expect("product");
        assert!(snapshot.in_vendor_scope(product, "thermo fisher korea"));

        let offers = snapshot.offers_for(&ProductId::from("prod-fbs")).expect("offers");
        assert_eq!(offers, vec![repriced]);
    }

    #[tokio::test]
    async fn offer_for_unknown_product_is_rejected() {
        let repo = SqlCatalogRepository::new(setup().await);

        let error = repo
            .save_offer(VendorOffer::new("ghost", "vendor-v1", Decimal::ONE, Some(1)))
            .await
            .expect_err("foreign key violation");

        assert!(matches!(error, RepositoryError::Database(_)));
    }

    #[tokio::test]
    async fn embedding_can_be_attached_later() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_product(CatalogProduct::new("prod-pbs", "PBS")).await.expect("save");

        repo.save_embedding(&ProductId::from("prod-pbs"), &Embedding(vec![1.0, 0.0]))
            .await
            .expect("save embedding");

        let loaded =
            repo.find_product(&ProductId::from("prod-pbs")).await.expect("find").expect("exists");
        assert_eq!(loaded.embedding, Some(Embedding(vec![1.0, 0.0])));
    }

    #[tokio::test]
    async fn malformed_price_surfaces_as_decode_error() {
        let pool = setup().await;
        let repo = SqlCatalogRepository::new(pool.clone());
        repo.save_product(CatalogProduct::new("prod-pbs", "PBS")).await.expect("save");
        repo.save_offer(VendorOffer::new("prod-pbs", "vendor-v1", Decimal::ONE, Some(1)))
            .await
            .expect("save offer");
        sqlx::query("UPDATE vendor_offer SET price = 'twelve'")
            .execute(&pool)
            .await
            .expect("corrupt price");

        let error = repo.load_snapshot().await.expect_err("decode failure");

        assert!(matches!(error, RepositoryError::Decode(message) if message.contains("twelve")));
    }
}
