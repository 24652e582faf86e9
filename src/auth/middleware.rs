//! Authentication middleware for axum.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::ApiKeyValidator;
use crate::error::TodoError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Reject requests without a valid `X-API-Key` header.
pub async fn require_api_key(
    State(validator): State<ApiKeyValidator>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, TodoError> {
    // A header that is not valid UTF-8 cannot match; treat it as a wrong key.
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.to_str().unwrap_or("\u{FFFD}"));

    validator.verify(api_key)?;

    Ok(next.run(request).await)
}
