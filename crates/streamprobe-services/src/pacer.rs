//! Produces a finite sequence of chunks with a delay before each one.
//!
//! A fresh Pacer is built per request and is not restartable. Dropping it
//! (e.g. when the client disconnects and hyper drops the body) cancels the
//! pending delay and any remaining production.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use futures::stream::{self, Stream};

use streamprobe_core::config::{PacerConfig, SourceKind};
use streamprobe_core::StreamChunk;

pub const SYNTHETIC_CONTENT_TYPE: &str = "text/plain";

/// Resource problems detected before any response headers are sent.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to read {0}: {1}")]
    Unreadable(PathBuf, io::Error),
    #[error("{0} is empty")]
    Empty(PathBuf),
    #[error("file source configured without a file path")]
    MissingPath,
}

enum ChunkSource {
    Synthetic { chunk_size: usize, chunk_count: u64 },
    /// Read once, sliced without copying.
    Resource { data: Bytes, chunk_size: usize, offset: usize },
}

impl ChunkSource {
    fn exhausted(&self, produced: u64) -> bool {
        match self {
            ChunkSource::Synthetic { chunk_count, .. } => produced >= *chunk_count,
            ChunkSource::Resource { data, offset, .. } => *offset >= data.len(),
        }
    }

    fn take(&mut self, seq: u64) -> Bytes {
        match self {
            ChunkSource::Synthetic { chunk_size, .. } => synthetic_chunk(seq, *chunk_size),
            ChunkSource::Resource {
                data,
                chunk_size,
                offset,
            } => {
                let end = (*offset + *chunk_size).min(data.len());
                let slice = data.slice(*offset..end);
                *offset = end;
                slice
            }
        }
    }
}

pub struct Pacer {
    source: ChunkSource,
    delay: Duration,
    produced: u64,
    content_type: String,
    done: bool,
}

impl Pacer {
    pub fn synthetic(chunk_size: usize, chunk_count: u64, delay: Duration) -> Self {
        Self::new(
            ChunkSource::Synthetic {
                chunk_size,
                chunk_count,
            },
            delay,
            SYNTHETIC_CONTENT_TYPE.to_string(),
        )
    }

    pub fn from_bytes(
        data: Bytes,
        chunk_size: usize,
        delay: Duration,
        content_type: impl Into<String>,
    ) -> Self {
        Self::new(
            ChunkSource::Resource {
                data,
                chunk_size: chunk_size.max(1),
                offset: 0,
            },
            delay,
            content_type.into(),
        )
    }

    /// Read `path` into memory once. Fails if the file is unreadable or empty.
    pub async fn from_file(
        path: &Path,
        chunk_size: usize,
        delay: Duration,
    ) -> Result<Self, SetupError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| SetupError::Unreadable(path.to_path_buf(), e))?;
        if data.is_empty() {
            return Err(SetupError::Empty(path.to_path_buf()));
        }
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::from_bytes(
            Bytes::from(data),
            chunk_size,
            delay,
            content_type,
        ))
    }

    pub async fn from_config(config: &PacerConfig) -> Result<Self, SetupError> {
        match config.source {
            SourceKind::Synthetic => Ok(Self::synthetic(
                config.chunk_size,
                config.chunk_count,
                config.delay(),
            )),
            SourceKind::File => {
                let path = config.file_path.as_deref().ok_or(SetupError::MissingPath)?;
                Self::from_file(path, config.chunk_size, config.delay()).await
            }
        }
    }

    fn new(source: ChunkSource, delay: Duration, content_type: String) -> Self {
        Self {
            source,
            delay,
            produced: 0,
            content_type,
            done: false,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Wait out the pacing delay, then return the next chunk.
    /// Returns `None` once the source is exhausted, without delaying.
    pub async fn next_chunk(&mut self) -> Option<StreamChunk> {
        if self.done || self.source.exhausted(self.produced) {
            if !self.done {
                tracing::info!(chunks = self.produced, "pacer finished");
            }
            self.done = true;
            return None;
        }

        tokio::time::sleep(self.delay).await;

        self.produced += 1;
        let seq = self.produced;
        let data = self.source.take(seq);
        tracing::info!(seq, bytes = data.len(), "sending chunk");
        Some(StreamChunk { seq, data })
    }

    pub fn into_stream(self) -> impl Stream<Item = StreamChunk> + Send + 'static {
        stream::unfold(self, |mut pacer| async move {
            let chunk = pacer.next_chunk().await?;
            Some((chunk, pacer))
        })
    }
}

impl Drop for Pacer {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(produced = self.produced, "pacer dropped before exhaustion");
        }
    }
}

/// `--- Chunk N at <timestamp> ---\n` padded with `x` to `chunk_size`, newline-terminated.
pub fn synthetic_chunk(seq: u64, chunk_size: usize) -> Bytes {
    let header = format!(
        "--- Chunk {} at {} ---\n",
        seq,
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let padding = chunk_size.saturating_sub(header.len() + 1);

    let mut buf = Vec::with_capacity(header.len() + padding + 1);
    buf.extend_from_slice(header.as_bytes());
    buf.resize(header.len() + padding, b'x');
    buf.push(b'\n');
    Bytes::from(buf)
}
