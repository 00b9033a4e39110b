//! Paste HTTP handlers.

use crate::{
    constants::DEFAULT_RECENT_LIMIT,
    error::HttpError,
    models::paste::*,
    rate_limit::client_ip,
    AppError, AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ConnectInfo, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;

fn normalized_limit(limit: Option<usize>, cap: usize) -> usize {
    limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(cap)
}

fn reject_payload(rejection: JsonRejection, max_content_bytes: usize) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::paste_too_large(max_content_bytes);
    }
    tracing::debug!("Rejected paste payload: {}", rejection.body_text());
    AppError::BadRequest("Invalid payload".to_string())
}

/// Scheme and authority the client used to reach the server.
fn request_origin(headers: &HeaderMap, fallback_port: u16) -> String {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| *value == "http" || *value == "https")
        .unwrap_or("http");
    match header_str(header::HOST) {
        Some(host) => format!("{}://{}", scheme, host),
        None => format!("{}://localhost:{}", scheme, fallback_port),
    }
}

/// Create a new paste.
///
/// # Arguments
/// - `state`: Application state.
/// - `peer`: Socket address when the server runs with connect info.
/// - `headers`: Request headers, used for client metadata and links.
/// - `payload`: Paste creation payload.
///
/// # Returns
/// `201 Created` with the new id and links.
///
/// # Errors
/// Returns an error if validation or persistence fails.
pub async fn create_paste(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<CreatePasteRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    let max_content_bytes = state.config.max_content_bytes;
    let Json(req) = payload.map_err(|rejection| reject_payload(rejection, max_content_bytes))?;
    let input = req.validate(max_content_bytes)?;

    let client = ClientMeta {
        ip: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };
    let paste = state.db.pastes.create(input, client)?;
    tracing::debug!("Created paste {}", paste.id);

    let origin = request_origin(&headers, state.config.port);
    Ok((StatusCode::CREATED, Json(CreatedPaste::new(&paste, &origin))).into_response())
}

/// Fetch a paste by id.
///
/// # Errors
/// Returns an error if the paste does not exist or lookup fails.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PasteRecord>, HttpError> {
    Ok(Json(state.db.pastes.get_or_fail(Some(id.as_str()))?))
}

/// Serve paste content as a plain-text download.
pub async fn get_raw_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let paste = state.db.pastes.get_or_fail(Some(id.as_str()))?;
    let disposition = HeaderValue::from_str(&format!(
        "inline; filename=\"logpaste-{}.log\"",
        paste.id
    ))
    .map_err(|_| AppError::BadRequest("Invalid paste id".to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        paste.content,
    )
        .into_response())
}

/// List the most recent pastes, newest first.
///
/// `limit` defaults to 10 and is capped at the index capacity.
pub async fn list_recent(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<Vec<PasteSummary>>, HttpError> {
    let Query(query) =
        query.map_err(|_| AppError::BadRequest("Invalid limit".to_string()))?;
    let limit = normalized_limit(query.limit, state.db.index.cap());
    let items = state.db.pastes.list_recent(limit)?;
    Ok(Json(items))
}
