//! Audit rows for scrape, promotion and enrichment runs.
//!
//! A run is opened `queued`, flips to `running` as soon as the stage starts
//! work and is closed exactly once as `succeeded` (possibly with a summary of
//! per-item errors) or `failed`. Every transition is a guarded `UPDATE` that
//! only matches the expected prior status.

use cgintel_core::RunType;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// One audited pipeline run.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// [`RunType`] as text: `obf`, `amazon`, `promote` or `enrich`.
    pub run_type: String,
    /// `api` or `cli`.
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Rows staged (scrapes), promoted or enriched.
    pub records_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, run_type, trigger_source, status, \
     started_at, completed_at, records_processed, error_message, created_at";

/// Opens a `queued` run for `run_type`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_collection_run(
    pool: &PgPool,
    run_type: RunType,
    trigger_source: &str,
) -> Result<CollectionRunRow, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "INSERT INTO collection_runs (public_id, run_type, trigger_source) \
         VALUES ($1, $2, $3) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(run_type.as_str())
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// `queued -> running`, stamping `started_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// queued, or [`DbError::Sqlx`] if the update fails.
pub async fn start_collection_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    expect_transition(result.rows_affected(), id, "queued")
}

/// `running -> succeeded` with the processed count.
///
/// A stage that skipped some items still succeeds; `error_message` then holds
/// the joined item errors.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// running, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: i64,
    records_processed: i32,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    close_run(pool, id, "succeeded", records_processed, error_message).await
}

/// `running -> failed`. The processed count stays at zero.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// running, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_collection_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    close_run(pool, id, "failed", 0, Some(error_message)).await
}

async fn close_run(
    pool: &PgPool,
    id: i64,
    status: &str,
    records_processed: i32,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = $1, completed_at = NOW(), records_processed = $2, error_message = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(status)
    .bind(records_processed)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    expect_transition(result.rows_affected(), id, "running")
}

fn expect_transition(rows: u64, id: i64, expected_status: &'static str) -> Result<(), DbError> {
    if rows == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status,
        });
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has this `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_collection_run(pool: &PgPool, id: i64) -> Result<CollectionRunRow, DbError> {
    sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Newest runs first, optionally only those of one stage.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    run_type: Option<RunType>,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs \
         WHERE $1::text IS NULL OR run_type = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(run_type.map(RunType::as_str))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
