use axum::{extract::State, Extension, Json};
use cgintel_core::identity::is_valid_product_hash;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{extract::ValidJson, map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RevealBody {
    pub product_hash: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RevealedSourceItem {
    product_hash: String,
    acquisition_lead: String,
    source: Option<String>,
    external_id: Option<String>,
    brand: Option<String>,
    original_name: Option<String>,
    source_url: Option<String>,
    wholesale_price: Option<Decimal>,
    moq: Option<i32>,
    lead_time_days: Option<i32>,
    sample_ordered: bool,
    sample_approved: bool,
    listed_on_store: bool,
    revealed_at: Option<DateTime<Utc>>,
}

/// Reveals the real source behind an acquisition lead and stamps the reveal.
pub(super) async fn reveal_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidJson(body): ValidJson<RevealBody>,
) -> Result<Json<ApiResponse<RevealedSourceItem>>, ApiError> {
    let product_hash = body.product_hash.trim().to_ascii_lowercase();
    if !is_valid_product_hash(&product_hash) {
        return Err(ApiError::validation(
            req_id.0,
            "product_hash must be 16 hex characters",
        ));
    }

    let row = cgintel_db::reveal_source_intelligence(&state.pool, &product_hash)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(product_hash = %row.product_hash, "source intelligence revealed");

    let data = RevealedSourceItem {
        product_hash: row.product_hash,
        acquisition_lead: row.acquisition_lead,
        source: row.source,
        external_id: row.external_id,
        brand: row.brand,
        original_name: row.original_name,
        source_url: row.source_url,
        wholesale_price: row.wholesale_price,
        moq: row.moq,
        lead_time_days: row.lead_time_days,
        sample_ordered: row.sample_ordered,
        sample_approved: row.sample_approved,
        listed_on_store: row.listed_on_store,
        revealed_at: row.revealed_at,
    };
    Ok(ApiResponse::wrap(data, req_id.0))
}
