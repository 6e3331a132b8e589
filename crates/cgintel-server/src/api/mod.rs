mod collection_runs;
mod demand_signals;
mod enrich;
mod extract;
mod scrape;
mod source;
mod stocking;


use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use cgintel_core::AppConfig;
use cgintel_db::DbError;
use cgintel_pipeline::PipelineError;
use cgintel_scraper::ScraperClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin_token, AuthState, RateLimitState, RequestId,
    ADMIN_TOKEN_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub scraper: Arc<ScraperClient>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn wrap(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn validation(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    if matches!(error, DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::Db(e) => map_db_error(request_id, e),
        PipelineError::Validation(message) => ApiError::validation(request_id, message.clone()),
        PipelineError::Scraper(e) => {
            tracing::warn!(error = %e, "upstream request failed");
            ApiError::new(request_id, "upstream_error", "upstream request failed")
        }
        PipelineError::Csv(_) | PipelineError::Other(_) => {
            tracing::error!(error = %error, "pipeline step failed");
            ApiError::new(request_id, "internal_error", "pipeline step failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(ADMIN_TOKEN_HEADER),
        ])
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/admin/demand-signals",
            get(demand_signals::list_demand_signals),
        )
        .route(
            "/api/v1/admin/enrich",
            get(enrich::enrichment_stats).post(enrich::run_enrichment),
        )
        .route(
            "/api/v1/admin/scrape/obf",
            get(scrape::pipeline_stats).post(scrape::run_obf_scrape),
        )
        .route(
            "/api/v1/admin/reviews/amazon",
            post(scrape::run_amazon_import),
        )
        .route(
            "/api/v1/admin/stocking",
            get(stocking::list_decisions).post(stocking::upsert_decision),
        )
        .route(
            "/api/v1/admin/stocking/export",
            get(stocking::export_csv),
        )
        .route("/api/v1/admin/source/reveal", post(source::reveal_source))
        .route(
            "/api/v1/admin/runs",
            get(collection_runs::list_collection_runs),
        )
        // Auth wraps the limiter so only authenticated calls use the budget.
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_admin_token,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(admin_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match cgintel_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
