//! streamprobed: serves a paced, optionally compressed chunked body so a
//! client can observe whether compression forces buffering.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use streamprobe_api::ApiState;
use streamprobe_core::config::SourceKind;
use streamprobe_core::StreamProbeConfig;
use streamprobe_services::Pacer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StreamProbeConfig::load().context("failed to load config")?;

    // A missing resource would fail every request; refuse to start instead.
    if config.pacer.source == SourceKind::File {
        Pacer::from_config(&config.pacer)
            .await
            .context("pacer file source unusable")?;
    }

    tracing::info!(
        delay_ms = config.pacer.delay_ms,
        chunk_size = config.pacer.chunk_size,
        chunk_count = config.pacer.chunk_count,
        source = ?config.pacer.source,
        flush = ?config.compression.flush,
        "pacer configured"
    );

    let listener = streamprobe_api::bind(&config.server).await?;
    let addr = listener.local_addr()?;
    let state = ApiState::new(config);

    let modes: Vec<String> = state.codecs.modes().iter().map(|m| m.to_string()).collect();
    tracing::info!(modes = %modes.join(","), "codecs available");

    println!("Server running at http://{addr}");
    println!("\nTest with curl (use -N to disable buffering):");
    println!("  curl -N \"http://{addr}?format=none\"");
    println!("  curl -N \"http://{addr}?format=gzip\" | gunzip");
    println!("  curl -N \"http://{addr}?format=brotli\" | brotli -d");
    println!("  curl -N \"http://{addr}?format=zstd\" | zstd -d");

    streamprobe_api::serve(listener, state, async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
    })
    .await
}
