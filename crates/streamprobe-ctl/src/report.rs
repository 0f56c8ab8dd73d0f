//! Console rendering for arrival timelines and probe summaries.
//! Pure text; printing is left to the caller.

use streamprobe_core::{ArrivalEvent, ArrivalKind, Classification, CompressionMode, ProbeResult};

const RULE_WIDTH: usize = 60;

pub fn rule() -> String {
    "═".repeat(RULE_WIDTH)
}

pub fn section_header(mode: CompressionMode) -> Vec<String> {
    vec![
        String::new(),
        rule(),
        format!("  Testing: {mode} (raw compressed bytes arrival times)"),
        rule(),
    ]
}

/// One line per data arrival. `End` events render as nothing.
pub fn event_line(event: &ArrivalEvent) -> Option<String> {
    match event.kind {
        ArrivalKind::Data => Some(format!(
            "  [{:>5}ms] Chunk {}: {} bytes",
            event.elapsed_ms, event.sequence_index, event.byte_length
        )),
        ArrivalKind::End => None,
    }
}

pub fn summary_lines(result: &ProbeResult) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "  Total: {} bytes in {} chunks over {}ms",
            result.total_bytes, result.chunk_count, result.total_elapsed_ms
        ),
    ];
    if let Some(line) = classification_line(result.classification) {
        lines.push(line);
    }
    lines
}

pub fn classification_line(classification: Option<Classification>) -> Option<String> {
    classification.map(|c| match c {
        Classification::Buffered => {
            format!("  ⚠  {}: All data arrived in a single chunk", c.label())
        }
        Classification::Streaming => {
            format!("  ✓  {}: Data arrived in multiple chunks", c.label())
        }
    })
}

pub fn failure_line(err: &dyn std::fmt::Display) -> String {
    format!("  Error: {err}")
}
