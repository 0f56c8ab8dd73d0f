//! `GET /?format=<mode>`: paced body, optionally compressed, sent chunked.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use streamprobe_core::{CompressionMode, StreamProbeConfig};
use streamprobe_services::{CodecError, CodecRegistry, Pacer};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<StreamProbeConfig>,
    /// Codecs available to requests, after `compression.disabled` is applied.
    pub codecs: Arc<CodecRegistry>,
}

#[derive(Deserialize)]
pub struct StreamQuery {
    pub format: Option<String>,
}

pub async fn handle_stream(
    State(state): State<ApiState>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, (StatusCode, String)> {
    let token = query.format.as_deref().unwrap_or("none");
    let mode = token.parse::<CompressionMode>().map_err(|e| {
        tracing::warn!(format = token, "unknown format requested");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    tracing::info!(format = %mode, "request for format");

    let compressor = state
        .codecs
        .compressor(mode, state.config.compression.flush)
        .map_err(|e| {
            tracing::warn!(format = %mode, error = %e, "codec unavailable");
            let status = match e {
                CodecError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
                CodecError::Init(..) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })?;

    // Resource errors surface here, before any headers go out.
    let pacer = Pacer::from_config(&state.config.pacer).await.map_err(|e| {
        tracing::error!(error = %e, "stream setup failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let mut response = Response::builder().header(CONTENT_TYPE, pacer.content_type());
    if let Some(encoding) = compressor.content_encoding() {
        response = response.header(CONTENT_ENCODING, encoding);
    }

    let body = Body::from_stream(compressor.wrap(pacer.into_stream()));
    response
        .body(body)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
