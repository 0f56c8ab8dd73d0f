use crate::*;

use streamprobe_core::config::SourceKind;
use streamprobe_core::CompressionMode;
use streamprobe_ctl::ProbeError;

#[tokio::test]
async fn test_unknown_format_is_rejected() {
    let server = spawn_server(test_config()).await.unwrap();

    let response = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("{}/?format=xyz", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await.unwrap(), "Unknown format");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_disabled_codec_fails_fast() {
    let mut config = test_config();
    config.compression.disabled = vec![CompressionMode::Brotli];
    let server = spawn_server(config).await.unwrap();

    let err = probe_mode(&server, CompressionMode::Brotli).await.unwrap_err();
    match err {
        ProbeError::Status { status, body } => {
            assert_eq!(status, 501);
            assert_eq!(body, "unsupported encoding: brotli");
        }
        other => panic!("expected status error, got {other}"),
    }

    // Other modes are unaffected.
    let (_, result) = probe_mode(&server, CompressionMode::Gzip).await.unwrap();
    assert!(result.chunk_count >= 1);

    server.stop().await.unwrap();
}

/// A missing resource fails every mode before any body bytes arrive.
#[tokio::test]
async fn test_missing_resource_fails_every_mode() {
    let mut config = test_config();
    config.pacer.source = SourceKind::File;
    config.pacer.file_path = Some(std::env::temp_dir().join("streamprobe-integration-missing.png"));
    let server = spawn_server(config).await.unwrap();

    for mode in CompressionMode::ALL {
        let err = probe_mode(&server, mode).await.unwrap_err();
        assert!(
            matches!(err, ProbeError::Status { status: 500, .. }),
            "{mode}: {err}"
        );
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_server_gone_is_transport_error() {
    let server = spawn_server(test_config()).await.unwrap();
    let probe = server.probe();
    server.stop().await.unwrap();

    let err = probe.run(CompressionMode::None, |_| {}).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)), "{err}");
}
