pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use streamprobe_core::config::ServerConfig;
use streamprobe_core::StreamProbeConfig;
use streamprobe_services::CodecRegistry;

pub use handlers::ApiState;

impl ApiState {
    pub fn new(config: StreamProbeConfig) -> Self {
        let codecs = CodecRegistry::without(&config.compression.disabled);
        Self {
            config: Arc::new(config),
            codecs: Arc::new(codecs),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::handle_stream))
        .with_state(state)
        .layer(cors)
}

pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = format!("{}:{}", config.bind, config.port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "streamprobe listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
