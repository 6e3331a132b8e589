//! Database operations for `stocking_decisions`.

use chrono::{DateTime, Utc};
use cgintel_core::{Decision, Priority};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A stocking decision joined with the catalog fields admins see next to it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StockingDecisionRow {
    pub product_hash: String,
    pub decision: String,
    pub retail_price: Option<Decimal>,
    pub initial_quantity: Option<i32>,
    pub fulfillment_method: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub display_name: String,
    pub category: Option<String>,
    pub price_tier: Option<String>,
    pub catalog_status: String,
}

/// Admin write for one product's decision.
#[derive(Debug, Clone)]
pub struct StockingDecisionInput {
    pub product_hash: String,
    pub decision: Decision,
    pub retail_price: Option<Decimal>,
    pub initial_quantity: Option<i32>,
    pub fulfillment_method: Option<String>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
}

/// Everything the Shopify export needs for one stocked product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StockExportRow {
    pub product_hash: String,
    pub display_name: String,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub price_tier: Option<String>,
    pub key_actives: Vec<String>,
    pub suitable_for: Vec<String>,
    pub catalog_retail_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub decision_retail_price: Option<Decimal>,
    pub initial_quantity: Option<i32>,
    pub fulfillment_method: Option<String>,
    pub priority: Option<String>,
    pub acquisition_lead: Option<String>,
    pub wholesale_price: Option<Decimal>,
}

const DECISION_SELECT: &str = "SELECT sd.product_hash, sd.decision, sd.retail_price, \
            sd.initial_quantity, sd.fulfillment_method, sd.priority, sd.notes, \
            sd.created_at, sd.updated_at, \
            pc.display_name, pc.category, pc.price_tier, pc.status AS catalog_status \
     FROM stocking_decisions sd \
     JOIN product_catalog pc ON pc.product_hash = sd.product_hash";

/// Upserts a stocking decision and applies its catalog side effect.
///
/// A `stock` decision moves the catalog row to `listed` and flags the
/// sourcing row as listed. The decision write and the status change commit
/// together. Optional fields left `None` keep their stored value.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the catalog row does not exist, or
/// [`DbError::Sqlx`] if any statement fails.
pub async fn upsert_stocking_decision(
    pool: &PgPool,
    input: &StockingDecisionInput,
) -> Result<StockingDecisionRow, DbError> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, String>(
        "SELECT product_hash FROM product_catalog WHERE product_hash = $1 FOR UPDATE",
    )
    .bind(&input.product_hash)
    .fetch_optional(&mut *tx)
    .await?;
    if exists.is_none() {
        return Err(DbError::NotFound);
    }

    sqlx::query(
        "INSERT INTO stocking_decisions \
             (product_hash, decision, retail_price, initial_quantity, fulfillment_method, \
              priority, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (product_hash) DO UPDATE SET \
             decision           = EXCLUDED.decision, \
             retail_price       = COALESCE(EXCLUDED.retail_price, stocking_decisions.retail_price), \
             initial_quantity   = COALESCE(EXCLUDED.initial_quantity, stocking_decisions.initial_quantity), \
             fulfillment_method = COALESCE(EXCLUDED.fulfillment_method, stocking_decisions.fulfillment_method), \
             priority           = COALESCE(EXCLUDED.priority, stocking_decisions.priority), \
             notes              = COALESCE(EXCLUDED.notes, stocking_decisions.notes), \
             updated_at         = NOW()",
    )
    .bind(&input.product_hash)
    .bind(input.decision.as_str())
    .bind(input.retail_price)
    .bind(input.initial_quantity)
    .bind(&input.fulfillment_method)
    .bind(input.priority.map(Priority::as_str))
    .bind(&input.notes)
    .execute(&mut *tx)
    .await?;

    if input.decision.lists_product() {
        sqlx::query(
            "UPDATE product_catalog SET status = 'listed', updated_at = NOW() \
             WHERE product_hash = $1",
        )
        .bind(&input.product_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE source_intelligence SET listed_on_store = TRUE, updated_at = NOW() \
             WHERE product_hash = $1",
        )
        .bind(&input.product_hash)
        .execute(&mut *tx)
        .await?;
    }

    let row = sqlx::query_as::<_, StockingDecisionRow>(&format!(
        "{DECISION_SELECT} WHERE sd.product_hash = $1"
    ))
    .bind(&input.product_hash)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row)
}

/// Lists decisions, most recently updated first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stocking_decisions(
    pool: &PgPool,
    decision: Option<Decision>,
    limit: i64,
) -> Result<Vec<StockingDecisionRow>, DbError> {
    let rows = sqlx::query_as::<_, StockingDecisionRow>(&format!(
        "{DECISION_SELECT} \
         WHERE ($1::TEXT IS NULL OR sd.decision = $1) \
         ORDER BY sd.updated_at DESC, sd.product_hash \
         LIMIT $2"
    ))
    .bind(decision.map(Decision::as_str))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every `stock` decision joined with catalog and sourcing data,
/// ordered by priority rank then display name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stock_export_rows(pool: &PgPool) -> Result<Vec<StockExportRow>, DbError> {
    let rows = sqlx::query_as::<_, StockExportRow>(
        "SELECT sd.product_hash, pc.display_name, pc.category, pc.product_type, \
                pc.price_tier, pc.key_actives, pc.suitable_for, \
                pc.retail_price AS catalog_retail_price, pc.image_url, \
                sd.retail_price AS decision_retail_price, sd.initial_quantity, \
                sd.fulfillment_method, sd.priority, \
                si.acquisition_lead, si.wholesale_price \
         FROM stocking_decisions sd \
         JOIN product_catalog pc ON pc.product_hash = sd.product_hash \
         LEFT JOIN source_intelligence si ON si.product_hash = sd.product_hash \
         WHERE sd.decision = 'stock' \
         ORDER BY CASE sd.priority \
                      WHEN 'urgent' THEN 0 \
                      WHEN 'high' THEN 1 \
                      WHEN 'medium' THEN 2 \
                      WHEN 'low' THEN 3 \
                      ELSE 4 \
                  END, \
                  lower(pc.display_name), sd.product_hash",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
