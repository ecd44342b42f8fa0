//! seshd demo server
//!
//! Minimal HTTP front for the session store:
//! - `POST /login` starts a session and sets the session cookie
//! - `GET /me` is guarded and echoes the logged-in identifier
//! - `POST /logout` ends the session and clears the cookie
//! - `GET /stats` reports store occupancy
//!
//! # Examples
//!
//! ```bash
//! seshd --bind 127.0.0.1:8080 --segment-size 1000
//! curl -c jar -d '{"identifier":"pablo667"}' -H 'content-type: application/json' localhost:8080/login
//! curl -b jar localhost:8080/me
//! ```

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use seshdb::http::{clear_cookie, require_session, session_cookie, token_from_headers};
use seshdb::{token, SessionConfig, SessionManager, SessionStats};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// seshd - in-process session store demo server
#[derive(Parser, Debug)]
#[command(name = "seshd")]
#[command(version = seshdb::VERSION)]
#[command(about = "Session store demo server", long_about = None)]
struct Cli {
    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1:8080", env = "SESHD_BIND")]
    bind: SocketAddr,

    /// Slots per segment
    #[arg(long, default_value_t = 1000)]
    segment_size: usize,

    /// Fraction of the newest segment that triggers growth
    #[arg(long, default_value_t = 0.75)]
    resize_threshold: f64,

    /// TOML config file; overrides the individual flags when given
    #[arg(short, long, env = "SESHD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Deserialize)]
struct LoginRequest {
    identifier: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::from_path(path)?,
        None => SessionConfig {
            segment_size: cli.segment_size,
            resize_threshold: cli.resize_threshold,
        },
    };

    let manager = Arc::new(SessionManager::new(config)?);
    let app = router(manager);

    info!(addr = %cli.bind, "seshd listening");
    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(manager: Arc<SessionManager>) -> Router {
    let guarded = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&manager),
            require_session,
        ));

    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/stats", get(stats))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

async fn login(
    State(manager): State<Arc<SessionManager>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let token = manager.start(&req.identifier).map_err(|e| {
        warn!(error = %e, "Failed to start session");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session_cookie(&token))],
    ))
}

async fn me(headers: HeaderMap) -> impl IntoResponse {
    // the route guard already verified the token; just echo the identifier
    let identifier = token_from_headers(&headers)
        .and_then(|t| token::decode(t).ok())
        .map(|(_, id)| id.to_string())
        .unwrap_or_default();
    Json(serde_json::json!({ "identifier": identifier }))
}

async fn logout(
    State(manager): State<Arc<SessionManager>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(token) = token_from_headers(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    match manager.end(token) {
        Ok(()) => (
            StatusCode::NO_CONTENT,
            [(header::SET_COOKIE, clear_cookie())],
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Logout with invalid session");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

async fn stats(State(manager): State<Arc<SessionManager>>) -> Json<SessionStats> {
    Json(manager.stats())
}
