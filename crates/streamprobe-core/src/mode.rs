//! Compression modes selectable through the `format` query parameter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Exactly one mode is active per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    None,
    Gzip,
    Deflate,
    Brotli,
    Zstd,
}

/// Raised when a `format` token names no known mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown format")]
pub struct UnknownFormat(pub String);

impl CompressionMode {
    /// Probe order used by the ctl when no modes are given.
    pub const ALL: [CompressionMode; 5] = [
        CompressionMode::None,
        CompressionMode::Gzip,
        CompressionMode::Deflate,
        CompressionMode::Brotli,
        CompressionMode::Zstd,
    ];

    /// Token accepted in `?format=`.
    pub fn token(self) -> &'static str {
        match self {
            CompressionMode::None => "none",
            CompressionMode::Gzip => "gzip",
            CompressionMode::Deflate => "deflate",
            CompressionMode::Brotli => "brotli",
            CompressionMode::Zstd => "zstd",
        }
    }

    /// Registered `Content-Encoding` token, `None` for the identity mode.
    pub fn content_encoding(self) -> Option<&'static str> {
        match self {
            CompressionMode::None => None,
            CompressionMode::Gzip => Some("gzip"),
            CompressionMode::Deflate => Some("deflate"),
            CompressionMode::Brotli => Some("br"),
            CompressionMode::Zstd => Some("zstd"),
        }
    }

    pub fn is_identity(self) -> bool {
        self == CompressionMode::None
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CompressionMode {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompressionMode::ALL
            .into_iter()
            .find(|m| m.token() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}
