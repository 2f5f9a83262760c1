//! rmdemux-media: RealMedia container demultiplexing
//!
//! This crate splits RealMedia (`.rm`, `.rmvb`) files into their audio and
//! video elementary-stream packets and supports seeking through either the
//! index written into the file or one generated by scanning the data region.
//!
//! # Modules
//!
//! - `source` - Byte sources (`ByteSource`, `IoSource`)
//! - `rmf` - Chunk reader, header parser, stream registry, format records
//! - `index` - Embedded index chain reader and index generation
//! - `demux` - Demuxing session and the packet pull loop
//! - `seek` - Index-based seeking
//! - `packet` - Packets, packet sinks and per-stream queues
//!
//! # Usage
//!
//! ```no_run
//! use rmdemux_media::{DemuxOptions, RmDemuxer};
//!
//! let mut demuxer = RmDemuxer::open_path("clip.rm", DemuxOptions::default())?;
//! while let Some(packet) = demuxer.next_packet()? {
//!     println!("stream {} pts {:.3} {} bytes", packet.stream_id, packet.pts(), packet.len());
//! }
//! # Ok::<(), rmdemux_media::Error>(())
//! ```

pub mod demux;
pub mod error;
pub mod index;
pub mod packet;
pub mod rmf;
pub mod seek;
pub mod source;

pub use demux::{DemuxOptions, RmDemuxer, DEFAULT_MAX_RESYNC};
pub use error::{Error, Result};
pub use index::{Index, IndexEntry, IndexMode, IndexSource, StreamIndex};
pub use packet::{swap_byte_pairs, Packet, PacketQueues, PacketSink};
pub use rmf::{ContainerHeader, FourCc, StreamDescriptor, StreamKind, StreamRegistry};
pub use seek::{SeekMode, SeekOutcome, SeekTarget};
pub use source::{ByteSource, IoSource};

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod fixtures;
