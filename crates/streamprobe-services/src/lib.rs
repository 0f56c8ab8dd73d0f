//! Server-side stages. The Pacer produces paced
//! chunks, the Compressor optionally encodes them on the way out.

pub mod compressor;
pub mod pacer;

pub use compressor::{ChunkEncoder, CodecError, CodecRegistry, Compressor};
pub use pacer::{Pacer, SetupError};
