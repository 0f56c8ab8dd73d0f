use crate::*;

use streamprobe_core::config::{FlushPolicy, SourceKind};
use streamprobe_core::{ArrivalKind, Classification, CompressionMode};

/// Identity mode: one arrival per paced chunk, sizes preserved exactly.
#[tokio::test]
async fn test_identity_streams_every_chunk() {
    let server = spawn_server(test_config()).await.unwrap();

    let (events, result) = probe_mode(&server, CompressionMode::None).await.unwrap();
    let data = data_events(&events);

    assert_eq!(data.len() as u64, CHUNK_COUNT, "events: {events:?}");
    assert!(data.iter().all(|e| e.byte_length == CHUNK_SIZE as u64));
    assert_eq!(result.total_bytes, CHUNK_COUNT * CHUNK_SIZE as u64);
    assert_eq!(result.classification, Some(Classification::Streaming));
    assert!(result.total_elapsed_ms >= (CHUNK_COUNT - 1) * DELAY_MS);

    // Arrivals are spread over time, not bunched at the end.
    let spread = data.last().unwrap().elapsed_ms - data.first().unwrap().elapsed_ms;
    assert!(spread >= (CHUNK_COUNT - 2) * DELAY_MS, "spread {spread}ms");

    let end = events.last().unwrap();
    assert_eq!(end.kind, ArrivalKind::End);
    assert_eq!(end.byte_length, result.total_bytes);
    assert_eq!(end.sequence_index, CHUNK_COUNT);

    server.stop().await.unwrap();
}

/// At the stock 10 KiB chunk size every chunk still lands as one arrival.
#[tokio::test]
async fn test_identity_default_chunk_size_is_not_split() {
    let mut config = test_config();
    config.pacer.delay_ms = 200;
    config.pacer.chunk_size = DEFAULT_CHUNK_SIZE;
    let server = spawn_server(config).await.unwrap();

    for _ in 0..3 {
        let (events, result) = probe_mode(&server, CompressionMode::None).await.unwrap();
        let sizes: Vec<u64> = data_events(&events).iter().map(|e| e.byte_length).collect();
        assert_eq!(
            sizes,
            vec![DEFAULT_CHUNK_SIZE as u64; CHUNK_COUNT as usize],
            "events: {events:?}"
        );
        assert_eq!(result.chunk_count, CHUNK_COUNT);
        assert_eq!(result.classification, Some(Classification::Streaming));
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_flushing_codecs_stream() {
    let server = spawn_server(test_config()).await.unwrap();

    for mode in [
        CompressionMode::Gzip,
        CompressionMode::Deflate,
        CompressionMode::Brotli,
        CompressionMode::Zstd,
    ] {
        let (events, result) = probe_mode(&server, mode).await.unwrap();
        assert!(
            result.chunk_count >= CHUNK_COUNT,
            "{mode}: {} arrivals ({events:?})",
            result.chunk_count
        );
        assert_eq!(result.classification, Some(Classification::Streaming), "{mode}");
        assert!(result.total_elapsed_ms >= (CHUNK_COUNT - 1) * DELAY_MS);
        // Padding compresses well; the wire carries far less than the payload.
        assert!(result.total_bytes < CHUNK_COUNT * CHUNK_SIZE as u64, "{mode}");
    }

    server.stop().await.unwrap();
}

/// Deferred flushing reproduces the buffering defect: one arrival at the end.
#[tokio::test]
async fn test_deferred_flush_is_classified_buffered() {
    let mut config = test_config();
    config.compression.flush = FlushPolicy::Deferred;
    let server = spawn_server(config).await.unwrap();

    let (events, result) = probe_mode(&server, CompressionMode::Gzip).await.unwrap();
    assert_eq!(result.chunk_count, 1, "events: {events:?}");
    assert_eq!(result.classification, Some(Classification::Buffered));

    let only = data_events(&events)[0];
    assert!(only.elapsed_ms >= (CHUNK_COUNT - 1) * DELAY_MS);

    server.stop().await.unwrap();
}

/// Deferred flushing applies to codecs only; identity keeps streaming.
#[tokio::test]
async fn test_deferred_flush_leaves_identity_streaming() {
    let mut config = test_config();
    config.compression.flush = FlushPolicy::Deferred;
    let server = spawn_server(config).await.unwrap();

    let (events, result) = probe_mode(&server, CompressionMode::None).await.unwrap();
    assert_eq!(result.chunk_count, CHUNK_COUNT, "events: {events:?}");
    assert!(data_events(&events)
        .iter()
        .all(|e| e.byte_length == CHUNK_SIZE as u64));
    assert_eq!(result.classification, Some(Classification::Streaming));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_repeated_probe_gives_same_chunk_count() {
    let server = spawn_server(test_config()).await.unwrap();

    let (_, first) = probe_mode(&server, CompressionMode::None).await.unwrap();
    let (_, second) = probe_mode(&server, CompressionMode::None).await.unwrap();
    assert_eq!(first.chunk_count, second.chunk_count);
    assert_eq!(first.total_bytes, second.total_bytes);

    server.stop().await.unwrap();
}

/// File source: sliced into chunk_size pieces, last one short.
#[tokio::test]
async fn test_file_source_slices_resource() {
    let path = std::env::temp_dir().join(format!(
        "streamprobe-integration-{}.png",
        std::process::id()
    ));
    std::fs::write(&path, vec![0xAB; 2500]).unwrap();

    let mut config = test_config();
    config.pacer.source = SourceKind::File;
    config.pacer.file_path = Some(path.clone());
    config.pacer.chunk_size = 1000;
    let server = spawn_server(config).await.unwrap();

    let response = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("{}/?format=none", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.bytes().await.unwrap().len(), 2500);

    let (events, result) = probe_mode(&server, CompressionMode::None).await.unwrap();
    let sizes: Vec<u64> = data_events(&events).iter().map(|e| e.byte_length).collect();
    assert_eq!(sizes, vec![1000, 1000, 500]);
    assert_eq!(result.classification, None);

    server.stop().await.unwrap();
    let _ = std::fs::remove_file(&path);
}
