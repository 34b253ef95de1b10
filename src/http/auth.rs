use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;
use subtle::ConstantTimeEq;

use crate::config::AdminAuthMode;
use crate::http::AppError;
use crate::AppState;

/// Proof that the request passed the admin gate.
#[derive(Debug, Clone)]
pub struct AdminToken;

const ADMIN_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-admin-token");

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.admin_auth == AdminAuthMode::Disabled {
            return Ok(AdminToken);
        }

        let expected = state.admin_token.as_ref().ok_or_else(|| {
            tracing::error!("admin route called but no admin token is configured");
            AppError::internal("Server misconfigured: admin token missing")
        })?;

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(AppError::unauthorized("Unauthorized"));
        }

        Ok(AdminToken)
    }
}
