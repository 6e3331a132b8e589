use axum::{extract::State, Extension, Json};
use cgintel_core::RunType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    extract::ValidQuery, map_db_error, normalize_limit, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct CollectionRunsQuery {
    pub run_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CollectionRunItem {
    run_id: i64,
    public_id: Uuid,
    run_type: String,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    records_processed: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<cgintel_db::CollectionRunRow> for CollectionRunItem {
    fn from(row: cgintel_db::CollectionRunRow) -> Self {
        Self {
            run_id: row.id,
            public_id: row.public_id,
            run_type: row.run_type,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            records_processed: row.records_processed,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

/// Recent scrape, promotion and enrichment runs, newest first.
///
/// `run_type` narrows the list to one stage (`obf`, `amazon`, `promote`,
/// `enrich`).
pub(super) async fn list_collection_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidQuery(query): ValidQuery<CollectionRunsQuery>,
) -> Result<Json<ApiResponse<Vec<CollectionRunItem>>>, ApiError> {
    let run_type = query
        .run_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::parse::<RunType>)
        .transpose()
        .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?;

    let limit = normalize_limit(query.limit);
    let rows = cgintel_db::list_collection_runs(&state.pool, run_type, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(CollectionRunItem::from).collect();
    Ok(ApiResponse::wrap(data, req_id.0))
}
