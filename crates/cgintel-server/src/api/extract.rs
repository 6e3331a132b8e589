//! `Json` and `Query` wrappers whose rejections use the API error envelope.
//!
//! Every rejection (malformed JSON, missing fields, wrong content type, bad
//! query values) becomes a 400 `validation_error` carrying axum's message.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, Extensions},
    Json,
};
use serde::de::DeserializeOwned;

use crate::middleware::RequestId;

use super::ApiError;

pub(super) struct ValidJson<T>(pub T);

pub(super) struct ValidQuery<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id_of(req.extensions());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected JSON body");
                Err(ApiError::validation(request_id, rejection.body_text()))
            }
        }
    }
}

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected query string");
                Err(ApiError::validation(
                    request_id_of(&parts.extensions),
                    rejection.body_text(),
                ))
            }
        }
    }
}

fn request_id_of(extensions: &Extensions) -> String {
    extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}
