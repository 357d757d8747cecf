use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use photocloud_types::api::Claims;

use crate::AppState;
use crate::error::ApiError;

/// Header the web client stores its token in.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Reject the request unless it carries a valid, unexpired token; otherwise
/// hand the verified claims to the handler as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".into()))?;

    let claims = verify_token(&state.jwt_secret, token)
        .map_err(|_| ApiError::Unauthorized("Token is not valid".into()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// `x-auth-token: <jwt>`, or `Authorization: Bearer <jwt>` as a fallback.
fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token.trim());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Check signature and expiry.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
