//! Wraps a chunk stream with an incremental encoder.
//!
//! Every codec sits behind [`ChunkEncoder`]. Encoders write into an owned
//! `Vec<u8>` sink; after each input chunk the sink is flushed (sync flush)
//! and drained, so compressed bytes leave as soon as the codec emits them.

use std::collections::HashMap;
use std::io::{self, Write};
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use streamprobe_core::{CompressionMode, FlushPolicy, StreamChunk};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unsupported encoding: {0}")]
    Unsupported(CompressionMode),
    #[error("failed to initialise {0} encoder: {1}")]
    Init(CompressionMode, io::Error),
}

/// Incremental encoder: one call per input chunk, then one `finish`.
pub trait ChunkEncoder: Send {
    /// Encode `input` and return whatever output the codec released.
    /// May be empty.
    fn encode(&mut self, input: Bytes) -> io::Result<Bytes>;

    /// Finalise the codec and return trailing bytes.
    fn finish(self: Box<Self>) -> io::Result<Bytes>;
}

/// Identity encoder for `CompressionMode::None`.
struct Passthrough;

impl ChunkEncoder for Passthrough {
    fn encode(&mut self, input: Bytes) -> io::Result<Bytes> {
        Ok(input)
    }

    fn finish(self: Box<Self>) -> io::Result<Bytes> {
        Ok(Bytes::new())
    }
}

/// A codec writer whose output lands in an owned `Vec<u8>`.
trait SinkWriter: Write + Send {
    fn sink(&mut self) -> &mut Vec<u8>;
    fn close(self) -> io::Result<Vec<u8>>;
}

struct Flushing<W>(W);

impl<W: SinkWriter> ChunkEncoder for Flushing<W> {
    fn encode(&mut self, input: Bytes) -> io::Result<Bytes> {
        self.0.write_all(&input)?;
        self.0.flush()?;
        Ok(Bytes::from(std::mem::take(self.0.sink())))
    }

    fn finish(self: Box<Self>) -> io::Result<Bytes> {
        self.0.close().map(Bytes::from)
    }
}

#[cfg(feature = "gzip")]
impl SinkWriter for flate2::write::GzEncoder<Vec<u8>> {
    fn sink(&mut self) -> &mut Vec<u8> {
        self.get_mut()
    }

    fn close(self) -> io::Result<Vec<u8>> {
        self.finish()
    }
}

// HTTP `deflate` is the zlib-wrapped format.
#[cfg(feature = "deflate")]
impl SinkWriter for flate2::write::ZlibEncoder<Vec<u8>> {
    fn sink(&mut self) -> &mut Vec<u8> {
        self.get_mut()
    }

    fn close(self) -> io::Result<Vec<u8>> {
        self.finish()
    }
}

#[cfg(feature = "brotli")]
impl SinkWriter for brotli::CompressorWriter<Vec<u8>> {
    fn sink(&mut self) -> &mut Vec<u8> {
        self.get_mut()
    }

    fn close(self) -> io::Result<Vec<u8>> {
        Ok(self.into_inner())
    }
}

#[cfg(feature = "zstd")]
impl SinkWriter for zstd::stream::write::Encoder<'static, Vec<u8>> {
    fn sink(&mut self) -> &mut Vec<u8> {
        self.get_mut()
    }

    fn close(self) -> io::Result<Vec<u8>> {
        self.finish()
    }
}

#[cfg(feature = "brotli")]
const BROTLI_BUFFER: usize = 4096;
#[cfg(feature = "brotli")]
const BROTLI_QUALITY: u32 = 5;
#[cfg(feature = "brotli")]
const BROTLI_LGWIN: u32 = 22;
#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 3;

type EncoderCtor = fn() -> io::Result<Box<dyn ChunkEncoder>>;

fn passthrough() -> io::Result<Box<dyn ChunkEncoder>> {
    Ok(Box::new(Passthrough))
}

#[cfg(feature = "gzip")]
fn gzip_encoder() -> io::Result<Box<dyn ChunkEncoder>> {
    let w = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    Ok(Box::new(Flushing(w)))
}

#[cfg(feature = "deflate")]
fn deflate_encoder() -> io::Result<Box<dyn ChunkEncoder>> {
    let w = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    Ok(Box::new(Flushing(w)))
}

#[cfg(feature = "brotli")]
fn brotli_encoder() -> io::Result<Box<dyn ChunkEncoder>> {
    let w = brotli::CompressorWriter::new(Vec::new(), BROTLI_BUFFER, BROTLI_QUALITY, BROTLI_LGWIN);
    Ok(Box::new(Flushing(w)))
}

#[cfg(feature = "zstd")]
fn zstd_encoder() -> io::Result<Box<dyn ChunkEncoder>> {
    let w = zstd::stream::write::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
    Ok(Box::new(Flushing(w)))
}

/// Mode → encoder constructor. Modes without an entry are unsupported.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<CompressionMode, EncoderCtor>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut codecs: HashMap<CompressionMode, EncoderCtor> = HashMap::new();
        codecs.insert(CompressionMode::None, passthrough);
        #[cfg(feature = "gzip")]
        codecs.insert(CompressionMode::Gzip, gzip_encoder);
        #[cfg(feature = "deflate")]
        codecs.insert(CompressionMode::Deflate, deflate_encoder);
        #[cfg(feature = "brotli")]
        codecs.insert(CompressionMode::Brotli, brotli_encoder);
        #[cfg(feature = "zstd")]
        codecs.insert(CompressionMode::Zstd, zstd_encoder);
        Self { codecs }
    }
}

impl CodecRegistry {
    /// All codecs compiled in, minus `disabled`. Identity is always kept.
    pub fn without(disabled: &[CompressionMode]) -> Self {
        let mut registry = Self::default();
        for mode in disabled {
            if !mode.is_identity() {
                registry.codecs.remove(mode);
            }
        }
        registry
    }

    pub fn supports(&self, mode: CompressionMode) -> bool {
        self.codecs.contains_key(&mode)
    }

    /// Supported modes in probe order.
    pub fn modes(&self) -> Vec<CompressionMode> {
        CompressionMode::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }

    /// Build a compressor for `mode`. Never falls back to identity.
    pub fn compressor(
        &self,
        mode: CompressionMode,
        flush: FlushPolicy,
    ) -> Result<Compressor, CodecError> {
        let ctor = self.codecs.get(&mode).ok_or(CodecError::Unsupported(mode))?;
        let encoder = ctor().map_err(|e| CodecError::Init(mode, e))?;
        Ok(Compressor {
            mode,
            flush,
            encoder,
        })
    }
}

pub struct Compressor {
    mode: CompressionMode,
    flush: FlushPolicy,
    encoder: Box<dyn ChunkEncoder>,
}

struct WrapState<S> {
    source: Pin<Box<S>>,
    encoder: Option<Box<dyn ChunkEncoder>>,
    flush: FlushPolicy,
    held: BytesMut,
}

impl Compressor {
    pub fn mode(&self) -> CompressionMode {
        self.mode
    }

    /// Value for the `Content-Encoding` response header, if any.
    pub fn content_encoding(&self) -> Option<&'static str> {
        self.mode.content_encoding()
    }

    /// Policy actually applied to the body. Identity is never held back.
    pub fn flush_policy(&self) -> FlushPolicy {
        if self.mode.is_identity() {
            FlushPolicy::PerChunk
        } else {
            self.flush
        }
    }

    /// Transform `source` chunk by chunk. Empty encoder outputs are skipped.
    pub fn wrap<S>(self, source: S) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
    where
        S: Stream<Item = StreamChunk> + Send + 'static,
    {
        let state = WrapState {
            source: Box::pin(source),
            flush: self.flush_policy(),
            encoder: Some(self.encoder),
            held: BytesMut::new(),
        };

        stream::unfold(state, |mut st| async move {
            loop {
                st.encoder.as_ref()?;
                match st.source.next().await {
                    Some(chunk) => {
                        let encoder = st.encoder.as_mut()?;
                        match encoder.encode(chunk.data) {
                            Ok(out) if out.is_empty() => continue,
                            Ok(out) => match st.flush {
                                FlushPolicy::PerChunk => return Some((Ok(out), st)),
                                FlushPolicy::Deferred => st.held.extend_from_slice(&out),
                            },
                            Err(e) => {
                                tracing::warn!(seq = chunk.seq, error = %e, "encoder failed");
                                st.encoder = None;
                                return Some((Err(e), st));
                            }
                        }
                    }
                    None => {
                        let encoder = st.encoder.take()?;
                        let tail = match encoder.finish() {
                            Ok(tail) => tail,
                            Err(e) => return Some((Err(e), st)),
                        };
                        st.held.extend_from_slice(&tail);
                        if st.held.is_empty() {
                            return None;
                        }
                        let out = st.held.split().freeze();
                        return Some((Ok(out), st));
                    }
                }
            }
        })
    }
}
