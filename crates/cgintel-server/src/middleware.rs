use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Header carrying the admin token as an alternative to `Authorization`.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Admin token settings used by the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    token: Option<Arc<str>>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AuthState {
    /// Builds auth settings from the loaded `ADMIN_TOKEN`.
    ///
    /// In development a missing token disables auth for local iteration.
    /// Elsewhere a missing token fails startup.
    pub fn from_config(config: &cgintel_core::AppConfig) -> anyhow::Result<Self> {
        match config.admin_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(Self::with_token(token)),
            _ if config.is_development() => {
                tracing::warn!("ADMIN_TOKEN not set; admin auth disabled in development environment");
                Ok(Self::disabled())
            }
            _ => anyhow::bail!("ADMIN_TOKEN is required outside development"),
        }
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(Arc::from(token)),
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            token: None,
            enabled: false,
        }
    }

    fn allows(&self, candidate: &str) -> bool {
        self.token
            .as_deref()
            .is_some_and(|token| bool::from(token.as_bytes().ct_eq(candidate.as_bytes())))
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by all admin routes.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a new `UUIDv4` is
/// generated. The ID is stored as a [`RequestId`] extension and echoed on the
/// response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the admin token when enabled.
///
/// The token is accepted as `Authorization: Bearer <token>` or in the
/// `x-admin-token` header.
pub async fn require_admin_token(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let authorized = extract_admin_token(req.headers()).is_some_and(|token| auth.allows(token));
    if authorized {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(MiddlewareErrorBody {
            error: MiddlewareError {
                code: "unauthorized",
                message: "missing or invalid admin token",
            },
        }),
    )
        .into_response()
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    if window.started_at.elapsed() >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_admin_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let header = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    bearer
        .or(header)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn extract_admin_token_accepts_bearer_header() {
        let map = headers(&[("authorization", "Bearer test-token")]);
        assert_eq!(extract_admin_token(&map), Some("test-token"));
    }

    #[test]
    fn extract_admin_token_accepts_custom_header() {
        let map = headers(&[("x-admin-token", "test-token")]);
        assert_eq!(extract_admin_token(&map), Some("test-token"));
    }

    #[test]
    fn extract_admin_token_rejects_non_bearer_scheme() {
        let map = headers(&[("authorization", "Basic abc123")]);
        assert_eq!(extract_admin_token(&map), None);
    }

    #[test]
    fn extract_admin_token_rejects_blank_value() {
        let map = headers(&[("authorization", "Bearer   ")]);
        assert_eq!(extract_admin_token(&map), None);
    }

    #[test]
    fn auth_state_compares_whole_token() {
        let auth = AuthState::with_token("s3cret");
        assert!(auth.allows("s3cret"));
        assert!(!auth.allows("s3cre"));
        assert!(!auth.allows("s3cret-and-more"));
        assert!(!AuthState::disabled().allows("s3cret"));
    }

    #[test]
    fn auth_state_debug_redacts_token() {
        let rendered = format!("{:?}", AuthState::with_token("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
