//! services/api/src/web/middleware.rs
//!
//! Owner-extraction middleware for protecting routes.
//!
//! Identity management is out of scope for this service; the upstream
//! gateway authenticates the mobile session and forwards the verified user
//! id in the `x-user-id` header. This middleware is the seam where a real
//! auth layer plugs in.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

/// Middleware that extracts the owner id from the `x-user-id` header.
///
/// If present and valid, inserts the owner `Uuid` into request extensions
/// for handlers to use. If missing or malformed, returns 401 Unauthorized.
pub async fn require_owner(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let raw = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let owner_id = Uuid::parse_str(raw).map_err(|_| {
        warn!("rejected request with malformed x-user-id header");
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(owner_id);
    Ok(next.run(req).await)
}
