//! Demuxing session: header, stream registry, optional index and the packet
//! pull loop.

use crate::index::{self, Index, IndexEntry, IndexMode};
use crate::packet::{swap_byte_pairs, Packet, PacketSink};
use crate::rmf::{
    parse_header, ChunkHeader, ChunkRead, ChunkTag, ContainerHeader, PacketCount, StreamKind,
    StreamRegistry, DATA_HEADER_SIZE, DEFAULT_MAX_STREAMS, PACKET_HEADER_SIZE,
};
use crate::source::{ByteSource, IoSource};
use crate::{Error, Result};
use bytes::BytesMut;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Default number of malformed packets tolerated in a single pull.
pub const DEFAULT_MAX_RESYNC: u32 = 64;

/// Session options, fixed at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemuxOptions {
    /// Index strategy used at open.
    pub index_mode: IndexMode,
    /// Log every index entry after a build.
    pub dump_index: bool,
    /// Malformed packets skipped in one pull before giving up.
    pub max_resync_attempts: u32,
    /// Stream slots per kind.
    pub max_streams: usize,
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self {
            index_mode: IndexMode::default(),
            dump_index: false,
            max_resync_attempts: DEFAULT_MAX_RESYNC,
            max_streams: DEFAULT_MAX_STREAMS,
        }
    }
}

/// Read position within the current `DATA` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataCursor {
    /// Packets left in the chunk, when it declared a count.
    pub(crate) remaining: PacketCount,
    /// Offset of the next `DATA` chunk, 0 if none.
    pub(crate) next: u32,
}

impl DataCursor {
    /// Read to the end of the source.
    pub(crate) const UNBOUNDED: Self = Self {
        remaining: PacketCount::Unknown,
        next: 0,
    };

    fn is_exhausted(&self) -> bool {
        self.remaining == PacketCount::Known(0)
    }

    fn consume(&mut self) {
        if let PacketCount::Known(n) = &mut self.remaining {
            *n = n.saturating_sub(1);
        }
    }
}

/// A RealMedia demuxer over a byte source.
///
/// The demuxer owns its source for the whole session. Calls must be
/// serialized by the caller.
pub struct RmDemuxer<S> {
    pub(crate) source: S,
    pub(crate) header: ContainerHeader,
    pub(crate) registry: StreamRegistry,
    pub(crate) index: Option<Index>,
    pub(crate) options: DemuxOptions,
    pub(crate) packets_read: u32,
    pub(crate) audio_packets: usize,
    pub(crate) video_packets: usize,
    pub(crate) chunk: DataCursor,
    /// `DATA` chunks entered so far, by offset.
    pub(crate) chunks_seen: HashSet<u64>,
}

impl RmDemuxer<IoSource<BufReader<File>>> {
    /// Open a file from disk.
    pub fn open_path<P: AsRef<Path>>(path: P, options: DemuxOptions) -> Result<Self> {
        Self::open(IoSource::open(path)?, options)
    }
}

impl<S: ByteSource> RmDemuxer<S> {
    /// Parse the header section and, depending on `options.index_mode`,
    /// build an index.
    ///
    /// The source must be positioned at the `.RMF` magic. An index that
    /// cannot be built leaves the demuxer forward-only; it never fails the
    /// open.
    pub fn open(mut source: S, options: DemuxOptions) -> Result<Self> {
        let (header, registry) = parse_header(&mut source, options.max_streams)?;
        log_summary(&header, &registry);

        let mode = options.index_mode;
        let chunk = DataCursor {
            remaining: header.total_packets,
            next: header.next_data_offset,
        };
        let first_chunk = header
            .first_packet_offset
            .saturating_sub(u64::from(DATA_HEADER_SIZE));
        let mut demuxer = Self {
            source,
            header,
            registry,
            index: None,
            options,
            packets_read: 0,
            audio_packets: 0,
            video_packets: 0,
            chunk,
            chunks_seen: HashSet::from([first_chunk]),
        };
        demuxer.build_index(mode)?;
        Ok(demuxer)
    }

    /// Build (or rebuild) the index with the given strategy.
    ///
    /// The new index replaces the old one only once it is complete; a failed
    /// build leaves the demuxer without an index. Returns whether an index is
    /// available afterwards.
    pub fn build_index(&mut self, mode: IndexMode) -> Result<bool> {
        let built = index::build_index(&mut self.source, &self.header, mode)?;
        if let Some(index) = &built {
            if self.options.dump_index {
                index.dump();
            }
        }
        self.index = built;
        Ok(self.index.is_some())
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub fn options(&self) -> &DemuxOptions {
        &self.options
    }

    /// Whether [`seek`](Self::seek) can succeed at all.
    pub fn is_seekable(&self) -> bool {
        self.index.is_some()
    }

    /// Current byte position in the source.
    pub fn position(&self) -> u64 {
        self.source.tell()
    }

    /// Packets consumed so far, including ones for unregistered streams.
    pub fn packets_read(&self) -> u32 {
        self.packets_read
    }

    /// Consume the demuxer and return its source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Pull the next packet for a registered stream.
    ///
    /// Returns `Ok(None)` at end of stream: once a data chunk's declared
    /// packet count has been reached (not exceeded) and no further `DATA`
    /// chunk is chained, or at the end of the source when the count is
    /// unknown. Packets with an impossible
    /// length and packets for unregistered streams are skipped; more than
    /// `max_resync_attempts` malformed packets in one call is an error, after
    /// which pulling may continue.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        match self.pull() {
            Ok(packet) => Ok(Some(packet)),
            Err(e) if e.is_eof() => {
                debug!("End of stream after {} packets", self.packets_read);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Pull the next packet into `sink`. Returns `false` at end of stream.
    pub fn read_packet<K: PacketSink + ?Sized>(&mut self, sink: &mut K) -> Result<bool> {
        match self.next_packet()? {
            Some(packet) => {
                sink.push(packet);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn pull(&mut self) -> Result<Packet> {
        let mut malformed = 0u32;

        loop {
            if self.chunk.is_exhausted() {
                if !self.enter_next_data_chunk()? {
                    return Err(Error::Eof);
                }
                continue;
            }

            let offset = self.source.tell();
            self.source.skip(2)?;
            let length = self.source.read_u16()?;

            if length < PACKET_HEADER_SIZE {
                malformed += 1;
                warn!("Bad packet length {} at {:#x}, resyncing", length, offset);
                self.source.skip(u64::from(length))?;
                if malformed > self.options.max_resync_attempts {
                    return Err(Error::ResyncLimit(malformed));
                }
                continue;
            }

            let stream_id = self.source.read_u16()?;
            let timestamp = self.source.read_u32()?;
            self.source.skip(1)?;
            let flags = self.source.read_u8()?;
            self.packets_read += 1;
            self.chunk.consume();

            let payload_len = usize::from(length - PACKET_HEADER_SIZE);

            let Some((kind, _)) = self.registry.lookup(stream_id) else {
                warn!("Packet for unknown stream {} at {:#x}, skipping", stream_id, offset);
                self.source.skip(payload_len as u64)?;
                continue;
            };

            let pos = self.source.tell();
            let mut data = BytesMut::zeroed(payload_len);
            self.source.read(&mut data)?;

            match kind {
                StreamKind::Audio => {
                    self.audio_packets += 1;
                    let swap = self
                        .registry
                        .get(stream_id)
                        .and_then(|s| s.as_audio())
                        .is_some_and(|a| a.needs_byte_swap());
                    if swap {
                        swap_byte_pairs(&mut data);
                    }
                }
                StreamKind::Video => self.video_packets += 1,
            }

            trace!(
                "Packet {}: stream {} ({}) ts={} len={} flags={:#04x} pos={:#x}",
                self.packets_read,
                stream_id,
                kind,
                timestamp,
                payload_len,
                flags,
                pos
            );

            return Ok(Packet {
                stream_id,
                kind,
                data: data.freeze(),
                timestamp,
                pos,
                flags,
            });
        }
    }

    /// Move to the next chained `DATA` chunk. Returns `false` when the chain
    /// ends, loops, or points at something other than a `DATA` chunk.
    fn enter_next_data_chunk(&mut self) -> Result<bool> {
        let offset = u64::from(self.chunk.next);
        if offset == 0 {
            return Ok(false);
        }
        if !self.chunks_seen.insert(offset) {
            warn!("DATA chunk chain loops back to {:#x}", offset);
            self.chunk.next = 0;
            return Ok(false);
        }

        self.source.seek(offset)?;
        let header = ChunkHeader::read(&mut self.source)?;
        if header.tag != ChunkTag::Data {
            warn!("Expected DATA chunk at {:#x}, found {}", offset, header.tag);
            self.chunk.next = 0;
            return Ok(false);
        }
        let count = self.source.read_u32()?;
        let next = self.source.read_u32()?;
        debug!(
            "Entering DATA chunk at {:#x}: {} packets, next {:#x}",
            offset, count, next
        );
        self.chunk = DataCursor {
            remaining: PacketCount::from_declared(count),
            next,
        };
        Ok(true)
    }

    /// Find the `DATA` chunk holding `entry` and the cursor for reading on
    /// from it. Returns the chunk offset with the cursor.
    ///
    /// Packet numbers are counted across the chain, so a chunk following
    /// one with an unknown count yields an unbounded cursor.
    pub(crate) fn locate_data_chunk(
        &mut self,
        entry: &IndexEntry,
    ) -> Result<Option<(u64, DataCursor)>> {
        let mut offset = self
            .header
            .first_packet_offset
            .saturating_sub(u64::from(DATA_HEADER_SIZE));
        let mut first_packet = Some(0u32);
        let mut visited = HashSet::new();

        while offset != 0 && visited.insert(offset) {
            self.source.seek(offset)?;
            let header = ChunkHeader::read(&mut self.source)?;
            if header.tag != ChunkTag::Data {
                break;
            }
            let count = PacketCount::from_declared(self.source.read_u32()?);
            let next = self.source.read_u32()?;

            let end = offset + u64::from(header.size);
            if (offset..end).contains(&entry.offset) {
                let remaining = match (count, first_packet) {
                    (PacketCount::Known(n), Some(first)) => {
                        let before = entry.packet_no.saturating_sub(first);
                        PacketCount::Known(n.saturating_sub(before))
                    }
                    _ => PacketCount::Unknown,
                };
                return Ok(Some((offset, DataCursor { remaining, next })));
            }

            first_packet = match count {
                PacketCount::Known(n) => first_packet.map(|first| first.saturating_add(n)),
                PacketCount::Unknown => None,
            };
            offset = u64::from(next);
        }

        Ok(None)
    }
}

impl<S> std::fmt::Debug for RmDemuxer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RmDemuxer")
            .field("streams", &self.registry.len())
            .field("seekable", &self.index.is_some())
            .field("packets_read", &self.packets_read)
            .finish()
    }
}

/// Log one line per stream of an opened file.
fn log_summary(header: &ContainerHeader, registry: &StreamRegistry) {
    for stream in registry.iter() {
        info!(
            "Stream {}: {} {} ({}), avg bitrate {}",
            stream.id,
            stream.kind(),
            stream.codec_tag(),
            stream.codec_name(),
            stream.avg_bitrate
        );
    }
    for skipped in &header.skipped_streams {
        info!("Stream {} skipped: {}", skipped.id, skipped.reason);
    }
}
