//! Configuration system for streamprobe.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $STREAMPROBE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/streamprobe/config.toml
//!   3. ~/.config/streamprobe/config.toml
//!
//! Defaults reproduce the reference diagnostic: port 3000, five 10 KB
//! chunks, 500 ms apart.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::mode::CompressionMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamProbeConfig {
    pub server: ServerConfig,
    pub pacer: PacerConfig,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// 0 = OS-assigned.
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Padded text chunks with a sequence/timestamp header.
    Synthetic,
    /// A static file sliced into `chunk_size` pieces.
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    /// Delay before each chunk becomes available.
    pub delay_ms: u64,
    pub chunk_size: usize,
    /// Synthetic source only. A file source ends when the file is exhausted.
    pub chunk_count: u64,
    pub source: SourceKind,
    pub file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Flush the encoder after every input chunk.
    PerChunk,
    /// Hold all encoder output until the stream ends.
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub flush: FlushPolicy,
    /// Modes removed from the codec registry.
    pub disabled: Vec<CompressionMode>,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            chunk_size: 10 * 1024,
            chunk_count: 5,
            source: SourceKind::Synthetic,
            file_path: None,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            flush: FlushPolicy::PerChunk,
            disabled: Vec::new(),
        }
    }
}

impl PacerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("streamprobe")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StreamProbeConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            StreamProbeConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("STREAMPROBE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Reject combinations the pacer cannot serve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pacer.chunk_size == 0 {
            return Err(ConfigError::Invalid("pacer.chunk_size must be > 0".into()));
        }
        if self.pacer.source == SourceKind::File && self.pacer.file_path.is_none() {
            return Err(ConfigError::Invalid(
                "pacer.source = \"file\" requires pacer.file_path".into(),
            ));
        }
        Ok(())
    }

    /// Apply STREAMPROBE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("STREAMPROBE_SERVER__BIND") {
            self.server.bind = v;
        }
        if let Ok(v) = std::env::var("STREAMPROBE_SERVER__PORT") {
            if let Ok(p) = v.parse() {
                self.server.port = p;
            }
        }
        if let Ok(v) = std::env::var("STREAMPROBE_PACER__DELAY_MS") {
            if let Ok(ms) = v.parse() {
                self.pacer.delay_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("STREAMPROBE_PACER__CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.pacer.chunk_size = n;
            }
        }
        if let Ok(v) = std::env::var("STREAMPROBE_PACER__CHUNK_COUNT") {
            if let Ok(n) = v.parse() {
                self.pacer.chunk_count = n;
            }
        }
        if let Ok(v) = std::env::var("STREAMPROBE_PACER__FILE_PATH") {
            self.pacer.file_path = Some(PathBuf::from(v));
            self.pacer.source = SourceKind::File;
        }
        if let Ok(v) = std::env::var("STREAMPROBE_COMPRESSION__FLUSH") {
            match v.as_str() {
                "per_chunk" => self.compression.flush = FlushPolicy::PerChunk,
                "deferred" => self.compression.flush = FlushPolicy::Deferred,
                _ => {}
            }
        }
    }
}
