//! Chunks produced by the server and arrival events recorded by the probe.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::mode::CompressionMode;

/// Chunk counts at or above this are classified as streaming.
pub const STREAMING_THRESHOLD: u64 = 5;

/// One paced chunk. Sequence numbers start at 1.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub seq: u64,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalKind {
    /// A read that delivered body bytes.
    Data,
    /// Synthetic terminator carrying cumulative totals.
    End,
}

/// A single read completion on the client side.
///
/// For `ArrivalKind::End`, `byte_length` is the total byte count and
/// `sequence_index` the number of data events that preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalEvent {
    pub elapsed_ms: u64,
    pub byte_length: u64,
    pub sequence_index: u64,
    pub kind: ArrivalKind,
}

impl ArrivalEvent {
    pub fn data(elapsed_ms: u64, byte_length: u64, sequence_index: u64) -> Self {
        Self {
            elapsed_ms,
            byte_length,
            sequence_index,
            kind: ArrivalKind::Data,
        }
    }

    pub fn end(elapsed_ms: u64, total_bytes: u64, chunk_count: u64) -> Self {
        Self {
            elapsed_ms,
            byte_length: total_bytes,
            sequence_index: chunk_count,
            kind: ArrivalKind::End,
        }
    }

    pub fn is_data(&self) -> bool {
        self.kind == ArrivalKind::Data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Streaming,
    Buffered,
}

impl Classification {
    pub fn label(self) -> &'static str {
        match self {
            Classification::Streaming => "STREAMING",
            Classification::Buffered => "BUFFERED",
        }
    }
}

/// Coarse buffering heuristic.
///
/// A single arrival for a compressed mode is buffered; `STREAMING_THRESHOLD`
/// or more arrivals is streaming. Anything in between stays unclassified.
pub fn classify(mode: CompressionMode, chunk_count: u64) -> Option<Classification> {
    if chunk_count == 1 && !mode.is_identity() {
        Some(Classification::Buffered)
    } else if chunk_count >= STREAMING_THRESHOLD {
        Some(Classification::Streaming)
    } else {
        None
    }
}

/// Summary of one probe run, derived only from its arrival events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub mode: CompressionMode,
    pub total_bytes: u64,
    pub chunk_count: u64,
    pub total_elapsed_ms: u64,
    pub classification: Option<Classification>,
}

impl ProbeResult {
    pub fn from_events(mode: CompressionMode, events: &[ArrivalEvent]) -> Self {
        let data = events.iter().filter(|e| e.is_data());
        let (chunk_count, total_bytes) =
            data.fold((0u64, 0u64), |(n, b), e| (n + 1, b + e.byte_length));

        // End carries the elapsed time after the final read returned EOF.
        let total_elapsed_ms = events
            .iter()
            .rev()
            .find(|e| e.kind == ArrivalKind::End)
            .or_else(|| events.last())
            .map(|e| e.elapsed_ms)
            .unwrap_or(0);

        Self {
            mode,
            total_bytes,
            chunk_count,
            total_elapsed_ms,
            classification: classify(mode, chunk_count),
        }
    }
}
