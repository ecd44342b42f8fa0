//! HTTP cookie adapter
//!
//! Carries the session token as a `session` cookie and guards routes with
//! an axum middleware. The store itself is transport-free; everything
//! HTTP-shaped lives here or in the caller's handlers.

use crate::store::SessionManager;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Name of the cookie that carries the session token
pub const SESSION_COOKIE: &str = "session";

/// `Set-Cookie` value installing `token`
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, token)
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// Pull the session token out of the `Cookie` header, if present
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

/// Middleware guarding authenticated routes
///
/// Requests without a live session get `401 Unauthorized`; everything else
/// passes through untouched. Attach with
/// `middleware::from_fn_with_state(manager, require_session)`.
pub async fn require_session(
    State(manager): State<Arc<SessionManager>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = token_from_headers(req.headers()) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if let Err(e) = manager.verify(token) {
        warn!(error = %e, "Rejected session token");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}
