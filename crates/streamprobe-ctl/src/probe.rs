//! One GET per mode, timestamping every body frame as it lands.
//!
//! The HTTP/1 client reads into a fixed buffer of `read_buf_size` bytes, so a
//! paced chunk no larger than that is decoded as a single data frame. Each
//! arrival is reported before the next frame is polled. No decompression
//! happens here; the bytes counted are the wire bytes.

use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use streamprobe_core::{ArrivalEvent, CompressionMode};

/// Default client read buffer. Comfortably above the 10 KiB reference chunk.
pub const DEFAULT_READ_BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid URL {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("body read failed: {0}")]
    Body(#[from] hyper::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct Probe {
    client: Client<HttpConnector, Empty<Bytes>>,
    base_url: String,
}

impl Probe {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProbeError> {
        Self::with_read_buf_size(base_url, DEFAULT_READ_BUF_SIZE)
    }

    /// Build a probe whose reads never exceed `read_buf_size` bytes.
    /// Chunks larger than this are reported as several arrivals.
    pub fn with_read_buf_size(
        base_url: impl Into<String>,
        read_buf_size: usize,
    ) -> Result<Self, ProbeError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // Fail on a malformed base before any request is attempted.
        parse_uri(&base_url)?;

        let client = Client::builder(TokioExecutor::new())
            .http1_read_buf_exact_size(read_buf_size.max(1))
            .build_http();
        Ok(Self { client, base_url })
    }

    pub fn url(&self, mode: CompressionMode) -> String {
        format!("{}/?format={}", self.base_url, mode)
    }

    /// Probe `mode`, calling `on_event` for every arrival as it happens.
    ///
    /// The returned events end with an `End` event carrying the totals.
    /// Non-2xx responses yield `ProbeError::Status` and no events.
    pub async fn run<F>(
        &self,
        mode: CompressionMode,
        mut on_event: F,
    ) -> Result<Vec<ArrivalEvent>, ProbeError>
    where
        F: FnMut(&ArrivalEvent),
    {
        let url = self.url(mode);
        let uri = parse_uri(&url)?;

        let start = Instant::now();
        let response = self.client.get(uri).await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.into_body().collect().await {
                Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
                Err(_) => String::new(),
            };
            return Err(ProbeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response.into_body();
        let mut events = Vec::new();
        let mut chunk_count = 0u64;
        let mut total_bytes = 0u64;

        while let Some(frame) = body.frame().await {
            // Trailers carry no payload.
            let Ok(data) = frame?.into_data() else {
                continue;
            };
            if data.is_empty() {
                continue;
            }
            chunk_count += 1;
            total_bytes += data.len() as u64;
            let event = ArrivalEvent::data(elapsed_ms(start), data.len() as u64, chunk_count);
            on_event(&event);
            events.push(event);
        }

        let end = ArrivalEvent::end(elapsed_ms(start), total_bytes, chunk_count);
        on_event(&end);
        events.push(end);
        Ok(events)
    }
}

fn parse_uri(url: &str) -> Result<Uri, ProbeError> {
    url.parse::<Uri>().map_err(|e| ProbeError::Url {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
