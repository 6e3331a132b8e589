//! Read-model query behind the admin demand-signals view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Catalog row with its decision and sourcing context.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DemandSignalRow {
    pub product_hash: String,
    pub display_name: String,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub price_tier: Option<String>,
    pub efficacy_score: Option<f64>,
    pub key_actives: Vec<String>,
    pub retail_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub status: String,
    /// `pending` when no decision row exists yet.
    pub decision: String,
    pub priority: Option<String>,
    pub acquisition_lead: Option<String>,
    pub wholesale_price: Option<Decimal>,
    pub moq: Option<i32>,
    pub lead_time_days: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

/// Input filters for demand-signal listing. `None` means no filter.
#[derive(Debug, Clone, Default)]
pub struct DemandSignalFilters<'a> {
    pub category: Option<&'a str>,
    pub status: Option<&'a str>,
    pub decision: Option<&'a str>,
    pub limit: i64,
}

/// Returns catalog rows joined with stocking decisions and sourcing data,
/// best efficacy first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_demand_signals(
    pool: &PgPool,
    filters: DemandSignalFilters<'_>,
) -> Result<Vec<DemandSignalRow>, DbError> {
    let rows = sqlx::query_as::<_, DemandSignalRow>(
        "SELECT \
             pc.product_hash, pc.display_name, pc.category, pc.product_type, pc.price_tier, \
             pc.efficacy_score, pc.key_actives, pc.retail_price, pc.image_url, pc.status, \
             COALESCE(sd.decision, 'pending') AS decision, sd.priority, \
             si.acquisition_lead, si.wholesale_price, si.moq, si.lead_time_days, \
             pc.updated_at \
         FROM product_catalog pc \
         LEFT JOIN stocking_decisions sd ON sd.product_hash = pc.product_hash \
         LEFT JOIN source_intelligence si ON si.product_hash = pc.product_hash \
         WHERE ($1::TEXT IS NULL OR pc.category = $1) \
           AND ($2::TEXT IS NULL OR pc.status = $2) \
           AND ($3::TEXT IS NULL OR COALESCE(sd.decision, 'pending') = $3) \
         ORDER BY pc.efficacy_score DESC NULLS LAST, pc.display_name, pc.product_hash \
         LIMIT $4",
    )
    .bind(filters.category)
    .bind(filters.status)
    .bind(filters.decision)
    .bind(filters.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
