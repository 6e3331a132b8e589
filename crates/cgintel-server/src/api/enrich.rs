use axum::{extract::State, Extension, Json};
use cgintel_pipeline::{
    clamp_enrich_limit, EnrichMode, EnrichOptions, EnrichReport, TriggerSource,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    extract::ValidJson, map_db_error, map_pipeline_error, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct EnrichRequest {
    pub mode: Option<String>,
    pub limit: Option<i64>,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct EnrichmentStatsItem {
    catalog_total: i64,
    missing_price: i64,
    missing_image: i64,
    missing_both: i64,
    needs_enrichment: i64,
}

impl EnrichRequest {
    fn options(&self) -> Result<EnrichOptions, cgintel_pipeline::PipelineError> {
        let mode = match self.mode.as_deref() {
            Some(raw) => raw.parse::<EnrichMode>()?,
            None => EnrichMode::default(),
        };
        Ok(EnrichOptions {
            mode,
            limit: clamp_enrich_limit(self.limit),
            dry_run: self.dry_run,
        })
    }
}

pub(super) async fn enrichment_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<EnrichmentStatsItem>>, ApiError> {
    let row = cgintel_db::get_enrichment_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = EnrichmentStatsItem {
        catalog_total: row.catalog_total,
        missing_price: row.missing_price,
        missing_image: row.missing_image,
        missing_both: row.missing_both,
        needs_enrichment: row.needs_enrichment,
    };
    Ok(ApiResponse::wrap(data, req_id.0))
}

/// Runs one enrichment sweep. `{}` runs a full `all` sweep.
pub(super) async fn run_enrichment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidJson(request): ValidJson<EnrichRequest>,
) -> Result<Json<ApiResponse<EnrichReport>>, ApiError> {
    let options = request
        .options()
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    tracing::info!(
        mode = options.mode.as_str(),
        limit = options.limit,
        dry_run = options.dry_run,
        "enrichment requested"
    );

    let report = cgintel_pipeline::run_enrichment(
        &state.pool,
        &state.scraper,
        &state.config.obf_base_url,
        options,
        TriggerSource::Api,
    )
    .await
    .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::wrap(report, req_id.0))
}
