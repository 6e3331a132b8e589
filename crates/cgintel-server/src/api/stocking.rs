use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use cgintel_core::{identity::is_valid_product_hash, Decision, Priority};
use cgintel_db::StockingDecisionInput;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    extract::{ValidJson, ValidQuery},
    map_db_error, map_pipeline_error, normalize_limit, ApiError, ApiResponse, AppState,
};

const MAX_NOTES_LEN: usize = 2_000;

#[derive(Debug, Deserialize)]
pub(super) struct StockingQuery {
    pub decision: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct StockingDecisionBody {
    pub product_hash: String,
    pub decision: String,
    pub retail_price: Option<Decimal>,
    pub initial_quantity: Option<i32>,
    pub fulfillment_method: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct StockingDecisionItem {
    product_hash: String,
    display_name: String,
    category: Option<String>,
    price_tier: Option<String>,
    catalog_status: String,
    decision: String,
    retail_price: Option<Decimal>,
    initial_quantity: Option<i32>,
    fulfillment_method: Option<String>,
    priority: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<cgintel_db::StockingDecisionRow> for StockingDecisionItem {
    fn from(row: cgintel_db::StockingDecisionRow) -> Self {
        Self {
            product_hash: row.product_hash,
            display_name: row.display_name,
            category: row.category,
            price_tier: row.price_tier,
            catalog_status: row.catalog_status,
            decision: row.decision,
            retail_price: row.retail_price,
            initial_quantity: row.initial_quantity,
            fulfillment_method: row.fulfillment_method,
            priority: row.priority,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates an upsert body into a typed decision write.
fn validate_decision(body: StockingDecisionBody) -> Result<StockingDecisionInput, String> {
    let product_hash = body.product_hash.trim().to_ascii_lowercase();
    if !is_valid_product_hash(&product_hash) {
        return Err("product_hash must be 16 hex characters".to_string());
    }

    let decision = body
        .decision
        .parse::<Decision>()
        .map_err(|e| e.to_string())?;
    let priority = non_empty(body.priority)
        .map(|p| p.parse::<Priority>())
        .transpose()
        .map_err(|e| e.to_string())?;

    if body.retail_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err("retail_price must not be negative".to_string());
    }
    if body.initial_quantity.is_some_and(|q| q < 0) {
        return Err("initial_quantity must not be negative".to_string());
    }

    let notes = non_empty(body.notes);
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(format!("notes must be at most {MAX_NOTES_LEN} characters"));
    }

    Ok(StockingDecisionInput {
        product_hash,
        decision,
        retail_price: body.retail_price,
        initial_quantity: body.initial_quantity,
        fulfillment_method: non_empty(body.fulfillment_method),
        priority,
        notes,
    })
}

pub(super) async fn list_decisions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidQuery(query): ValidQuery<StockingQuery>,
) -> Result<Json<ApiResponse<Vec<StockingDecisionItem>>>, ApiError> {
    let decision = query
        .decision
        .as_deref()
        .map(str::parse::<Decision>)
        .transpose()
        .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?;

    let rows =
        cgintel_db::list_stocking_decisions(&state.pool, decision, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(StockingDecisionItem::from).collect();
    Ok(ApiResponse::wrap(data, req_id.0))
}

/// Records a decision. `stock` also lists the product in the catalog.
pub(super) async fn upsert_decision(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidJson(body): ValidJson<StockingDecisionBody>,
) -> Result<Json<ApiResponse<StockingDecisionItem>>, ApiError> {
    let input =
        validate_decision(body).map_err(|message| ApiError::validation(req_id.0.clone(), message))?;

    let row = cgintel_db::upsert_stocking_decision(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        product_hash = %row.product_hash,
        decision = %row.decision,
        catalog_status = %row.catalog_status,
        "stocking decision recorded"
    );

    Ok(ApiResponse::wrap(StockingDecisionItem::from(row), req_id.0))
}

/// Shopify product import CSV for every stocked product.
pub(super) async fn export_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let (csv, _rows) =
        cgintel_pipeline::export_stocked_csv(&state.pool, &state.config.store_vendor)
            .await
            .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    let filename = format!(
        "attachment; filename=\"shopify-import-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    let disposition = HeaderValue::from_str(&filename)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
