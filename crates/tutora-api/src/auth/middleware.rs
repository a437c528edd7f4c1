use crate::error::HttpAppError;
use crate::state::AuthState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tutora_core::AppError;

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Require `Authorization: Bearer <API_TOKEN>` on the wrapped routes.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            tracing::debug!(path = %request.uri().path(), "Missing authorization header");
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    if !secure_compare(token.trim(), &auth_state.api_token) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid bearer token");
        return HttpAppError(AppError::Unauthorized("Invalid token".to_string())).into_response();
    }

    next.run(request).await
}
