//! Database operations for `scrape_staging`.

use chrono::{DateTime, Utc};
use cgintel_core::StagingRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `scrape_staging` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StagingRow {
    pub product_hash: String,
    pub source: String,
    pub external_id: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub ingredients: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub scraped_at: DateTime<Utc>,
    /// `NULL` until the row has been promoted since its last scrape.
    pub promoted_at: Option<DateTime<Utc>>,
}

impl From<StagingRow> for StagingRecord {
    fn from(row: StagingRow) -> Self {
        StagingRecord {
            product_hash: row.product_hash,
            source: row.source,
            external_id: row.external_id,
            name: row.name,
            brand: row.brand,
            category: row.category,
            price: row.price,
            currency: row.currency,
            image_url: row.image_url,
            source_url: row.source_url,
            ingredients: row.ingredients,
            rating: row.rating,
            review_count: row.review_count,
            scraped_at: row.scraped_at,
        }
    }
}

/// Counters shown on the scrape admin page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PipelineStatsRow {
    pub staging_total: i64,
    pub staging_unpromoted: i64,
    pub staging_obf: i64,
    pub staging_amazon: i64,
    pub catalog_total: i64,
    pub catalog_listed: i64,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

const STAGING_COLUMNS: &str = "product_hash, source, external_id, name, brand, category, \
     price, currency, image_url, source_url, ingredients, rating, review_count, \
     scraped_at, promoted_at";

/// Upserts a scraped record by `product_hash`.
///
/// Every column is overwritten with the new scrape and `promoted_at` is
/// cleared so the next promotion pass picks the row up again.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_staging_record(pool: &PgPool, record: &StagingRecord) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scrape_staging \
             (product_hash, source, external_id, name, brand, category, price, currency, \
              image_url, source_url, ingredients, rating, review_count, scraped_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (product_hash) DO UPDATE SET \
             source       = EXCLUDED.source, \
             external_id  = EXCLUDED.external_id, \
             name         = EXCLUDED.name, \
             brand        = EXCLUDED.brand, \
             category     = EXCLUDED.category, \
             price        = EXCLUDED.price, \
             currency     = EXCLUDED.currency, \
             image_url    = EXCLUDED.image_url, \
             source_url   = EXCLUDED.source_url, \
             ingredients  = EXCLUDED.ingredients, \
             rating       = EXCLUDED.rating, \
             review_count = EXCLUDED.review_count, \
             scraped_at   = EXCLUDED.scraped_at, \
             promoted_at  = NULL",
    )
    .bind(&record.product_hash)
    .bind(&record.source)
    .bind(&record.external_id)
    .bind(&record.name)
    .bind(&record.brand)
    .bind(&record.category)
    .bind(record.price)
    .bind(&record.currency)
    .bind(&record.image_url)
    .bind(&record.source_url)
    .bind(&record.ingredients)
    .bind(record.rating)
    .bind(record.review_count)
    .bind(record.scraped_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetches one staging row by hash.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_staging_record(
    pool: &PgPool,
    product_hash: &str,
) -> Result<Option<StagingRow>, DbError> {
    let row = sqlx::query_as::<_, StagingRow>(&format!(
        "SELECT {STAGING_COLUMNS} FROM scrape_staging WHERE product_hash = $1"
    ))
    .bind(product_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns staging rows not yet promoted since their last scrape, oldest
/// scrape first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unpromoted_staging(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<StagingRow>, DbError> {
    let rows = sqlx::query_as::<_, StagingRow>(&format!(
        "SELECT {STAGING_COLUMNS} FROM scrape_staging \
         WHERE promoted_at IS NULL \
         ORDER BY scraped_at, product_hash \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamps `promoted_at = NOW()` on a staging row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_staging_promoted(
    conn: &mut sqlx::PgConnection,
    product_hash: &str,
) -> Result<(), DbError> {
    sqlx::query("UPDATE scrape_staging SET promoted_at = NOW() WHERE product_hash = $1")
        .bind(product_hash)
        .execute(conn)
        .await?;

    Ok(())
}

/// Returns staging and catalog counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_pipeline_stats(pool: &PgPool) -> Result<PipelineStatsRow, DbError> {
    let row = sqlx::query_as::<_, PipelineStatsRow>(
        "SELECT \
             (SELECT COUNT(*) FROM scrape_staging) AS staging_total, \
             (SELECT COUNT(*) FROM scrape_staging WHERE promoted_at IS NULL) AS staging_unpromoted, \
             (SELECT COUNT(*) FROM scrape_staging WHERE source = 'open_beauty_facts') AS staging_obf, \
             (SELECT COUNT(*) FROM scrape_staging WHERE source = 'amazon_de') AS staging_amazon, \
             (SELECT COUNT(*) FROM product_catalog) AS catalog_total, \
             (SELECT COUNT(*) FROM product_catalog WHERE status = 'listed') AS catalog_listed, \
             (SELECT MAX(scraped_at) FROM scrape_staging) AS last_scraped_at",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}
