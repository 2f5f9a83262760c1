//! RealMedia (`.rm`) container structures.
//!
//! A file is a flat sequence of chunks, each starting with a 4-byte tag,
//! a big-endian 32-bit size and a 16-bit object version:
//!
//! - `.RMF` file header
//! - `PROP` global properties
//! - `CONT` content description
//! - `MDPR` media properties, one per stream
//! - `DATA` packets, possibly chained to further `DATA` chunks
//! - `INDX` per-stream index chunks, chained by offset

mod chunks;
mod codec;
mod format;
mod header;
mod reader;
mod registry;
mod stream;

pub use chunks::{ChunkHeader, ChunkTag, FourCc};
pub use codec::{video_codec_name, AudioCodec, VideoSubId, FORMAT_AC3, FORMAT_ATRAC3, FORMAT_SIPR};
pub use format::{BitmapInfoHeader, WaveFormat, SIPR_EXTRA};
pub use header::{
    parse_header, ContainerHeader, ContentInfo, PacketCount, Properties, PropertyFlags, SkipReason,
    SkippedStream,
};
pub use reader::{ChunkRead, StrLen};
pub use registry::{StreamRegistry, DEFAULT_MAX_STREAMS};
pub use stream::{AudioStream, StreamDescriptor, StreamKind, StreamMedia, VideoStream};

/// Size of a chunk header: tag, size, version.
pub const CHUNK_HEADER_SIZE: u32 = 10;

/// Size of a data packet header.
pub const PACKET_HEADER_SIZE: u16 = 12;

/// Size of a `DATA` chunk header including packet count and next-chunk offset.
pub const DATA_HEADER_SIZE: u32 = 18;

/// Packet timestamps are expressed in ticks of this clock.
pub const CLOCK_RATE: f64 = 90_000.0;

/// Packet flag marking a keyframe.
pub const PACKET_FLAG_KEYFRAME: u8 = 0x02;

/// Keyframe bit in the flags handed to downstream consumers.
pub const DEMUX_FLAG_KEYFRAME: u32 = 0x10;
