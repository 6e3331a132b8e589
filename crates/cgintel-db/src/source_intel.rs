//! Database operations for `source_intelligence`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// A row from the `source_intelligence` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceIntelligenceRow {
    pub product_hash: String,
    pub acquisition_lead: String,
    pub wholesale_price: Option<Decimal>,
    pub moq: Option<i32>,
    pub lead_time_days: Option<i32>,
    pub sample_ordered: bool,
    pub sample_approved: bool,
    pub listed_on_store: bool,
    /// First time an admin revealed the sourcing details.
    pub revealed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sourcing intelligence joined with the staging origin it was scraped from.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevealedSourceRow {
    pub product_hash: String,
    pub acquisition_lead: String,
    pub wholesale_price: Option<Decimal>,
    pub moq: Option<i32>,
    pub lead_time_days: Option<i32>,
    pub sample_ordered: bool,
    pub sample_approved: bool,
    pub listed_on_store: bool,
    pub revealed_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub external_id: Option<String>,
    pub brand: Option<String>,
    pub original_name: Option<String>,
    pub source_url: Option<String>,
}

/// Inserts a sourcing stub for a freshly promoted product.
///
/// Existing rows are left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn ensure_source_intelligence(
    conn: &mut PgConnection,
    product_hash: &str,
    acquisition_lead: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO source_intelligence (product_hash, acquisition_lead) \
         VALUES ($1, $2) \
         ON CONFLICT (product_hash) DO NOTHING",
    )
    .bind(product_hash)
    .bind(acquisition_lead)
    .execute(conn)
    .await?;

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_source_intelligence(
    pool: &PgPool,
    product_hash: &str,
) -> Result<Option<SourceIntelligenceRow>, DbError> {
    let row = sqlx::query_as::<_, SourceIntelligenceRow>(
        "SELECT product_hash, acquisition_lead, wholesale_price, moq, lead_time_days, \
                sample_ordered, sample_approved, listed_on_store, revealed_at, \
                created_at, updated_at \
         FROM source_intelligence \
         WHERE product_hash = $1",
    )
    .bind(product_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Reveals the sourcing details behind an acquisition lead.
///
/// Stamps `revealed_at` on first reveal and returns the row joined with the
/// staging origin.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no sourcing row exists for the hash, or
/// [`DbError::Sqlx`] if a statement fails.
pub async fn reveal_source_intelligence(
    pool: &PgPool,
    product_hash: &str,
) -> Result<RevealedSourceRow, DbError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE source_intelligence \
         SET revealed_at = COALESCE(revealed_at, NOW()), updated_at = NOW() \
         WHERE product_hash = $1",
    )
    .bind(product_hash)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let row = sqlx::query_as::<_, RevealedSourceRow>(
        "SELECT si.product_hash, si.acquisition_lead, si.wholesale_price, si.moq, \
                si.lead_time_days, si.sample_ordered, si.sample_approved, \
                si.listed_on_store, si.revealed_at, \
                ss.source, ss.external_id, ss.brand, ss.name AS original_name, \
                COALESCE(ss.source_url, pc.source_url) AS source_url \
         FROM source_intelligence si \
         JOIN product_catalog pc ON pc.product_hash = si.product_hash \
         LEFT JOIN scrape_staging ss ON ss.product_hash = si.product_hash \
         WHERE si.product_hash = $1",
    )
    .bind(product_hash)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row)
}
