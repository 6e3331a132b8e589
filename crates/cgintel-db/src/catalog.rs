//! Database operations for `product_catalog`.
//!
//! Writes go through [`cgintel_core::merge_catalog`]: the stored row is
//! locked with `SELECT ... FOR UPDATE`, merged in Rust, and written back in
//! the same transaction.

use chrono::{DateTime, Utc};
use cgintel_core::{merge_catalog, CatalogFields, CatalogStatus, PriceTier};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::source_intel::ensure_source_intelligence;
use crate::staging::mark_staging_promoted;
use crate::DbError;

/// A row from the `product_catalog` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogProductRow {
    pub product_hash: String,
    pub display_name: String,
    pub category: Option<String>,
    pub product_type: Option<String>,
    /// One of `budget`, `mid`, `premium`, `luxury`, enforced by a CHECK.
    pub price_tier: Option<String>,
    pub efficacy_score: Option<f64>,
    pub key_actives: Vec<String>,
    pub suitable_for: Vec<String>,
    pub contraindications: Vec<String>,
    pub retail_price: Option<Decimal>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogProductRow {
    /// Parses the stored tier, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStoredValue`] for an unknown tier string.
    pub fn tier(&self) -> Result<Option<PriceTier>, DbError> {
        self.price_tier
            .as_deref()
            .map(str::parse::<PriceTier>)
            .transpose()
            .map_err(DbError::from)
    }

    /// Converts the row into the mergeable field set.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStoredValue`] if tier or status cannot be parsed.
    pub fn fields(&self) -> Result<CatalogFields, DbError> {
        Ok(CatalogFields {
            display_name: Some(self.display_name.clone()),
            category: self.category.clone(),
            product_type: self.product_type.clone(),
            price_tier: self.tier()?,
            efficacy_score: self.efficacy_score,
            key_actives: self.key_actives.clone(),
            suitable_for: self.suitable_for.clone(),
            contraindications: self.contraindications.clone(),
            retail_price: self.retail_price,
            currency: self.currency.clone(),
            image_url: self.image_url.clone(),
            source_url: self.source_url.clone(),
            status: Some(self.status.parse::<CatalogStatus>()?),
        })
    }
}

/// Result of a catalog merge-upsert.
#[derive(Debug, Clone)]
pub struct CatalogUpsertOutcome {
    pub row: CatalogProductRow,
    /// `true` when the row did not exist before this write.
    pub created: bool,
}

/// Enrichment backlog counters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrichmentStatsRow {
    pub catalog_total: i64,
    pub missing_price: i64,
    pub missing_image: i64,
    pub missing_both: i64,
    pub needs_enrichment: i64,
}

const CATALOG_COLUMNS: &str = "product_hash, display_name, category, product_type, price_tier, \
     efficacy_score, key_actives, suitable_for, contraindications, retail_price, currency, \
     image_url, source_url, status, created_at, updated_at";

/// Fetches a catalog row by hash.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_catalog_product(
    pool: &PgPool,
    product_hash: &str,
) -> Result<Option<CatalogProductRow>, DbError> {
    let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM product_catalog WHERE product_hash = $1"
    ))
    .bind(product_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Merge-upserts a catalog row, inserting it when absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails or
/// [`DbError::InvalidStoredValue`] if the stored row cannot be parsed.
pub async fn upsert_catalog_product(
    pool: &PgPool,
    product_hash: &str,
    incoming: CatalogFields,
) -> Result<CatalogUpsertOutcome, DbError> {
    let mut tx = pool.begin().await?;
    let outcome = merge_locked(&mut tx, product_hash, incoming, true).await?;
    tx.commit().await?;

    outcome.ok_or(DbError::NotFound)
}

/// Promotes one staging row: merge-upserts the catalog row, creates the
/// `source_intelligence` stub if missing, and stamps the staging row as
/// promoted, all in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn promote_catalog_product(
    pool: &PgPool,
    product_hash: &str,
    incoming: CatalogFields,
    acquisition_lead: &str,
) -> Result<CatalogUpsertOutcome, DbError> {
    let mut tx = pool.begin().await?;
    let outcome = merge_locked(&mut tx, product_hash, incoming, true)
        .await?
        .ok_or(DbError::NotFound)?;
    ensure_source_intelligence(&mut tx, product_hash, acquisition_lead).await?;
    mark_staging_promoted(&mut tx, product_hash).await?;
    tx.commit().await?;

    Ok(outcome)
}

/// Merges enrichment output into an existing catalog row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row does not exist, or
/// [`DbError::Sqlx`] if any statement fails.
pub async fn update_catalog_enrichment(
    pool: &PgPool,
    product_hash: &str,
    incoming: CatalogFields,
) -> Result<CatalogProductRow, DbError> {
    let mut tx = pool.begin().await?;
    let outcome = merge_locked(&mut tx, product_hash, incoming, false)
        .await?
        .ok_or(DbError::NotFound)?;
    tx.commit().await?;

    Ok(outcome.row)
}

/// Locks the stored row, merges, and writes the result back.
///
/// Returns `None` when the row is absent and `insert_if_missing` is false.
async fn merge_locked(
    conn: &mut PgConnection,
    product_hash: &str,
    incoming: CatalogFields,
    insert_if_missing: bool,
) -> Result<Option<CatalogUpsertOutcome>, DbError> {
    let existing = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM product_catalog WHERE product_hash = $1 FOR UPDATE"
    ))
    .bind(product_hash)
    .fetch_optional(&mut *conn)
    .await?;

    let created = existing.is_none();
    if created && !insert_if_missing {
        return Ok(None);
    }

    let existing_fields = existing.as_ref().map(CatalogProductRow::fields).transpose()?;
    let merged = merge_catalog(existing_fields.as_ref(), incoming);
    let display_name = merged
        .display_name
        .clone()
        .unwrap_or_else(|| product_hash.to_string());
    let status = merged.status.unwrap_or(CatalogStatus::Research);

    let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "INSERT INTO product_catalog \
             (product_hash, display_name, category, product_type, price_tier, efficacy_score, \
              key_actives, suitable_for, contraindications, retail_price, currency, \
              image_url, source_url, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (product_hash) DO UPDATE SET \
             display_name      = EXCLUDED.display_name, \
             category          = EXCLUDED.category, \
             product_type      = EXCLUDED.product_type, \
             price_tier        = EXCLUDED.price_tier, \
             efficacy_score    = EXCLUDED.efficacy_score, \
             key_actives       = EXCLUDED.key_actives, \
             suitable_for      = EXCLUDED.suitable_for, \
             contraindications = EXCLUDED.contraindications, \
             retail_price      = EXCLUDED.retail_price, \
             currency          = EXCLUDED.currency, \
             image_url         = EXCLUDED.image_url, \
             source_url        = EXCLUDED.source_url, \
             status            = EXCLUDED.status, \
             updated_at        = NOW() \
         RETURNING {CATALOG_COLUMNS}"
    ))
    .bind(product_hash)
    .bind(display_name)
    .bind(&merged.category)
    .bind(&merged.product_type)
    .bind(merged.price_tier.map(PriceTier::as_str))
    .bind(merged.efficacy_score)
    .bind(&merged.key_actives)
    .bind(&merged.suitable_for)
    .bind(&merged.contraindications)
    .bind(merged.retail_price)
    .bind(&merged.currency)
    .bind(&merged.image_url)
    .bind(&merged.source_url)
    .bind(status.as_str())
    .fetch_one(&mut *conn)
    .await?;

    Ok(Some(CatalogUpsertOutcome { row, created }))
}

/// Returns up to `limit` rows missing a retail price or an image.
///
/// Ordered by `efficacy_score DESC NULLS LAST, product_hash` so repeated
/// sweeps over an unchanged backlog visit rows in the same order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enrichment_candidates(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CatalogProductRow>, DbError> {
    let rows = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM product_catalog \
         WHERE retail_price IS NULL OR image_url IS NULL \
         ORDER BY efficacy_score DESC NULLS LAST, product_hash \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns enrichment backlog counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_enrichment_stats(pool: &PgPool) -> Result<EnrichmentStatsRow, DbError> {
    let row = sqlx::query_as::<_, EnrichmentStatsRow>(
        "SELECT \
             COUNT(*) AS catalog_total, \
             COUNT(*) FILTER (WHERE retail_price IS NULL) AS missing_price, \
             COUNT(*) FILTER (WHERE image_url IS NULL) AS missing_image, \
             COUNT(*) FILTER (WHERE retail_price IS NULL AND image_url IS NULL) AS missing_both, \
             COUNT(*) FILTER (WHERE retail_price IS NULL OR image_url IS NULL) AS needs_enrichment \
         FROM product_catalog",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}
