use axum::{extract::State, Extension, Json};
use cgintel_core::{estimated_margin_pct, CatalogStatus, Decision, PriceTier};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    extract::ValidQuery, map_db_error, normalize_limit, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct DemandSignalsQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub decision: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DemandSignalItem {
    product_hash: String,
    display_name: String,
    category: Option<String>,
    product_type: Option<String>,
    price_tier: Option<String>,
    efficacy_score: Option<f64>,
    key_actives: Vec<String>,
    retail_price: Option<Decimal>,
    image_url: Option<String>,
    status: String,
    decision: String,
    priority: Option<String>,
    acquisition_lead: Option<String>,
    wholesale_price: Option<Decimal>,
    moq: Option<i32>,
    lead_time_days: Option<i32>,
    estimated_margin_pct: Option<Decimal>,
    updated_at: DateTime<Utc>,
}

impl From<cgintel_db::DemandSignalRow> for DemandSignalItem {
    fn from(row: cgintel_db::DemandSignalRow) -> Self {
        let estimated_margin_pct = margin_for(row.wholesale_price, row.price_tier.as_deref());
        Self {
            product_hash: row.product_hash,
            display_name: row.display_name,
            category: row.category,
            product_type: row.product_type,
            price_tier: row.price_tier,
            efficacy_score: row.efficacy_score,
            key_actives: row.key_actives,
            retail_price: row.retail_price,
            image_url: row.image_url,
            status: row.status,
            decision: row.decision,
            priority: row.priority,
            acquisition_lead: row.acquisition_lead,
            wholesale_price: row.wholesale_price,
            moq: row.moq,
            lead_time_days: row.lead_time_days,
            estimated_margin_pct,
            updated_at: row.updated_at,
        }
    }
}

/// Margin estimate for a row; untiered rows are estimated as `mid`.
fn margin_for(wholesale: Option<Decimal>, tier: Option<&str>) -> Option<Decimal> {
    let tier = match tier {
        Some(value) => value.parse::<PriceTier>().ok()?,
        None => PriceTier::Mid,
    };
    estimated_margin_pct(wholesale?, tier)
}

/// Catalog rows joined with their decision and sourcing data.
pub(super) async fn list_demand_signals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidQuery(query): ValidQuery<DemandSignalsQuery>,
) -> Result<Json<ApiResponse<Vec<DemandSignalItem>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<CatalogStatus>)
        .transpose()
        .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?;
    let decision = query
        .decision
        .as_deref()
        .map(str::parse::<Decision>)
        .transpose()
        .map_err(|e| ApiError::validation(req_id.0.clone(), e.to_string()))?;
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let filters = cgintel_db::DemandSignalFilters {
        category,
        status: status.map(CatalogStatus::as_str),
        decision: decision.map(Decision::as_str),
        limit: normalize_limit(query.limit),
    };

    let rows = cgintel_db::list_demand_signals(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(DemandSignalItem::from).collect();
    Ok(ApiResponse::wrap(data, req_id.0))
}
