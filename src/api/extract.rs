//! Request extractors.
//!
//! [`AuthUser`] reads only the request head, so axum runs it before any body
//! extractor. A call without a valid identity is answered with 401 before its
//! body or path are looked at.
use super::AppState;
use super::error::ApiError;
use crate::error::LedgerError;
use crate::gateway::Caller;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Caller);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // a header that is not valid UTF-8 is malformed, not absent
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());

        match state.gateway.authenticate(header) {
            Ok(caller) => Ok(AuthUser(caller)),
            Err(err) => {
                tracing::warn!(path = %parts.uri.path(), "rejected unauthenticated call: {err}");
                Err(err.into())
            }
        }
    }
}

pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| LedgerError::validation(rejection.body_text()).into())
}

pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| LedgerError::validation(rejection.body_text()).into())
}
