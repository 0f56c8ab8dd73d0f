//! streamprobe-core: shared types and configuration.
//! Both the server side (pacer, compressor, api) and the ctl depend on this one.

pub mod config;
pub mod event;
pub mod mode;

pub use config::{ConfigError, FlushPolicy, SourceKind, StreamProbeConfig};
pub use event::{
    classify, ArrivalEvent, ArrivalKind, Classification, ProbeResult, StreamChunk,
    STREAMING_THRESHOLD,
};
pub use mode::{CompressionMode, UnknownFormat};
