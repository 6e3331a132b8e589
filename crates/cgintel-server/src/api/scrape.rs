use axum::{extract::State, Extension, Json};
use cgintel_pipeline::{ScrapeReport, ScrapeRequest, ScrapeSource, TriggerSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    extract::ValidJson, map_db_error, map_pipeline_error, ApiError, ApiResponse, AppState,
};

const MAX_TARGETS: usize = 20;

#[derive(Debug, Deserialize)]
pub(super) struct ObfScrapeBody {
    pub pages: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub promote: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AmazonImportBody {
    pub pages: Option<u32>,
    pub queries: Option<Vec<String>>,
    pub promote: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(super) struct PipelineStatsItem {
    staging_total: i64,
    staging_unpromoted: i64,
    staging_obf: i64,
    staging_amazon: i64,
    catalog_total: i64,
    catalog_listed: i64,
    last_scraped_at: Option<DateTime<Utc>>,
}

/// Builds the pipeline request; promotion runs unless explicitly disabled.
fn scrape_request(
    pages: Option<u32>,
    targets: Option<Vec<String>>,
    promote: Option<bool>,
) -> Result<ScrapeRequest, String> {
    let targets = targets.unwrap_or_default();
    if targets.len() > MAX_TARGETS {
        return Err(format!("at most {MAX_TARGETS} targets per run"));
    }
    if pages == Some(0) {
        return Err("pages must be between 1 and 5".to_string());
    }
    Ok(ScrapeRequest {
        pages,
        targets,
        promote: promote.unwrap_or(true),
    })
}

pub(super) async fn pipeline_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PipelineStatsItem>>, ApiError> {
    let row = cgintel_db::get_pipeline_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = PipelineStatsItem {
        staging_total: row.staging_total,
        staging_unpromoted: row.staging_unpromoted,
        staging_obf: row.staging_obf,
        staging_amazon: row.staging_amazon,
        catalog_total: row.catalog_total,
        catalog_listed: row.catalog_listed,
        last_scraped_at: row.last_scraped_at,
    };
    Ok(ApiResponse::wrap(data, req_id.0))
}

pub(super) async fn run_obf_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidJson(body): ValidJson<ObfScrapeBody>,
) -> Result<Json<ApiResponse<ScrapeReport>>, ApiError> {
    let request = scrape_request(body.pages, body.categories, body.promote)
        .map_err(|message| ApiError::validation(req_id.0.clone(), message))?;
    run(&state, req_id, ScrapeSource::OpenBeautyFacts, &request).await
}

pub(super) async fn run_amazon_import(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ValidJson(body): ValidJson<AmazonImportBody>,
) -> Result<Json<ApiResponse<ScrapeReport>>, ApiError> {
    let request = scrape_request(body.pages, body.queries, body.promote)
        .map_err(|message| ApiError::validation(req_id.0.clone(), message))?;
    run(&state, req_id, ScrapeSource::Amazon, &request).await
}

async fn run(
    state: &AppState,
    req_id: RequestId,
    source: ScrapeSource,
    request: &ScrapeRequest,
) -> Result<Json<ApiResponse<ScrapeReport>>, ApiError> {
    tracing::info!(
        source = source.run_type().as_str(),
        pages = ?request.pages,
        targets = request.targets.len(),
        promote = request.promote,
        "scrape requested"
    );

    let report = cgintel_pipeline::run_scrape(
        &state.pool,
        &state.scraper,
        &state.config,
        source,
        request,
        TriggerSource::Api,
    )
    .await
    .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::wrap(report, req_id.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_request_promotes_by_default() {
        let request = scrape_request(Some(2), None, None).expect("request");
        assert!(request.promote);
        assert!(request.targets.is_empty());
        assert_eq!(request.pages, Some(2));
    }

    #[test]
    fn scrape_request_rejects_zero_pages() {
        assert!(scrape_request(Some(0), None, Some(false)).is_err());
    }

    #[test]
    fn scrape_request_caps_target_count() {
        let targets = (0..=MAX_TARGETS).map(|i| format!("en:tag-{i}")).collect();
        assert!(scrape_request(None, Some(targets), None).is_err());
    }
}
