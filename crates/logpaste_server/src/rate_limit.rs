//! Per-client admission control for paste writes.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

const LIMITED_PATH_PREFIX: &str = "/api/pastes";

/// Best-effort client address: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header_value("x-forwarded-for")
        .and_then(|list| list.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        .or_else(|| header_value("x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Rate-limit key for a request; `"unknown"` when no address is available.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    client_ip(headers, peer).unwrap_or_else(|| "unknown".to_string())
}

/// Middleware counting `POST` requests under `/api/pastes` against the
/// fixed-window limiter. Other requests pass through untouched.
pub async fn limit_paste_writes(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    if req.method() != Method::POST || !req.uri().path().starts_with(LIMITED_PATH_PREFIX) {
        return Ok(next.run(req).await);
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = client_identity(req.headers(), peer);
    if let Err(err) = state.db.limits.admit(&identity)?.into_result() {
        tracing::debug!("Rejected paste write from {}", identity);
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
