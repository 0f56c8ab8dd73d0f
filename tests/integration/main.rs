//! streamprobe integration test harness.
//!
//! Each test starts an in-process server on 127.0.0.1:0 with short pacing
//! delays and probes it over real loopback HTTP. Most tests use 4 KiB chunks
//! to stay fast; the default 10 KiB size is covered separately.
//!
//!   cargo test --test integration

mod failures;
mod infra;
mod streaming;

pub use infra::*;
