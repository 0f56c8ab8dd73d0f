use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use streamprobe_api::ApiState;
use streamprobe_core::{ArrivalEvent, CompressionMode, ProbeResult, StreamProbeConfig};
use streamprobe_ctl::{Probe, ProbeError};

// ── Harness ───────────────────────────────────────────────────────────────────

pub const DELAY_MS: u64 = 100;
pub const CHUNK_SIZE: usize = 4096;
pub const CHUNK_COUNT: u64 = 5;
/// Chunk size of the stock configuration.
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024;

pub struct TestServer {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestServer {
    pub fn probe(&self) -> Probe {
        Probe::new(&self.base_url).expect("client should build")
    }

    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.context("server task panicked")?
    }
}

/// Reference pacing scaled down for tests.
pub fn test_config() -> StreamProbeConfig {
    let mut config = StreamProbeConfig::default();
    config.server.port = 0;
    config.pacer.delay_ms = DELAY_MS;
    config.pacer.chunk_size = CHUNK_SIZE;
    config.pacer.chunk_count = CHUNK_COUNT;
    config
}

pub async fn spawn_server(mut config: StreamProbeConfig) -> Result<TestServer> {
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = 0;

    let listener = streamprobe_api::bind(&config.server).await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(streamprobe_api::serve(
        listener,
        ApiState::new(config),
        async move {
            let _ = rx.await;
        },
    ));

    Ok(TestServer {
        base_url: format!("http://{addr}"),
        shutdown: Some(tx),
        handle,
    })
}

/// Run one probe and derive its result.
pub async fn probe_mode(
    server: &TestServer,
    mode: CompressionMode,
) -> std::result::Result<(Vec<ArrivalEvent>, ProbeResult), ProbeError> {
    let events = server.probe().run(mode, |_| {}).await?;
    let result = ProbeResult::from_events(mode, &events);
    Ok((events, result))
}

pub fn data_events(events: &[ArrivalEvent]) -> Vec<ArrivalEvent> {
    events.iter().copied().filter(|e| e.is_data()).collect()
}
