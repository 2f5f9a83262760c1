//! Per-stream packet index.
//!
//! An index is either read from the `INDX` chunk chain written by the muxer
//! or generated by scanning every packet header in the data region. Both
//! strategies produce the same [`Index`] structure. A build either completes
//! and is published whole, or yields no index at all.

mod embedded;
mod scan;

pub use embedded::read_index_chain;
pub use scan::scan_data_chunks;

use crate::rmf::{ContainerHeader, CLOCK_RATE, PACKET_FLAG_KEYFRAME};
use crate::source::ByteSource;
use crate::Result;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How an index is obtained when a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum IndexMode {
    /// No index; the file is forward-only.
    Off,
    /// Read the index chunks written into the file, if any.
    #[default]
    Embedded,
    /// Scan the data region and build an index from packet headers.
    Generate,
}

impl std::fmt::Display for IndexMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Embedded => write!(f, "embedded"),
            Self::Generate => write!(f, "generate"),
        }
    }
}

impl std::str::FromStr for IndexMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "embedded" | "parse" => Ok(Self::Embedded),
            "generate" | "scan" => Ok(Self::Generate),
            other => Err(format!("unknown index mode '{}'", other)),
        }
    }
}

/// Where an index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    Embedded,
    Generated,
}

/// One indexed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Timestamp in 90 kHz ticks.
    pub timestamp: u32,
    /// File offset of the packet header.
    pub offset: u64,
    /// Packet number within the data region.
    pub packet_no: u32,
    /// Packet length. Generated entries only.
    pub length: Option<u16>,
    /// Packet flags. Generated entries only.
    pub flags: Option<u8>,
}

impl IndexEntry {
    /// Whether the entry points at a keyframe.
    ///
    /// Embedded index entries carry no flags; muxers only index keyframes,
    /// so they count as keyframes.
    pub fn is_keyframe(&self) -> bool {
        self.flags.map_or(true, |f| f & PACKET_FLAG_KEYFRAME != 0)
    }

    /// Timestamp in seconds.
    pub fn time_secs(&self) -> f64 {
        f64::from(self.timestamp) / CLOCK_RATE
    }
}

/// Entries of a single stream, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct StreamIndex {
    entries: Vec<IndexEntry>,
}

impl StreamIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&IndexEntry> {
        self.entries.get(i)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn keyframe_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_keyframe()).count()
    }

    /// Position of the first keyframe entry at or after `from`.
    pub fn next_keyframe_from(&self, from: usize) -> Option<usize> {
        self.entries
            .iter()
            .skip(from)
            .position(IndexEntry::is_keyframe)
            .map(|p| from + p)
    }
}

/// Built index: one [`StreamIndex`] per stream that has entries.
#[derive(Debug, Clone)]
pub struct Index {
    source: IndexSource,
    streams: BTreeMap<u16, StreamIndex>,
}

impl Index {
    pub fn new(source: IndexSource) -> Self {
        Self {
            source,
            streams: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> IndexSource {
        self.source
    }

    pub fn stream(&self, id: u16) -> Option<&StreamIndex> {
        self.streams.get(&id)
    }

    /// Streams in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &StreamIndex)> {
        self.streams.iter().map(|(id, s)| (*id, s))
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn total_entries(&self) -> usize {
        self.streams.values().map(StreamIndex::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    pub(crate) fn push(&mut self, stream_id: u16, entry: IndexEntry) {
        self.streams.entry(stream_id).or_default().entries.push(entry);
    }

    pub(crate) fn extend(&mut self, stream_id: u16, entries: Vec<IndexEntry>) {
        self.streams
            .entry(stream_id)
            .or_default()
            .entries
            .extend(entries);
    }

    /// Log every entry.
    pub fn dump(&self) {
        for (id, stream) in self.iter() {
            info!("Index of stream {}: {} entries", id, stream.len());
            for (i, e) in stream.entries().iter().enumerate() {
                info!(
                    "  #{:<5} ts={:<10} ({:.3}s) pos={:#x} packet={} len={} flags={}",
                    i,
                    e.timestamp,
                    e.time_secs(),
                    e.offset,
                    e.packet_no,
                    e.length.map_or_else(|| "-".to_string(), |l| l.to_string()),
                    e.flags.map_or_else(|| "-".to_string(), |f| format!("{:#04x}", f)),
                );
            }
        }
    }
}

/// Build an index with the given strategy.
///
/// The source position is restored on every exit path. A failed build
/// resets the source and returns `Ok(None)`; only a failure to restore the
/// position is an error.
pub fn build_index<S: ByteSource + ?Sized>(
    src: &mut S,
    header: &ContainerHeader,
    mode: IndexMode,
) -> Result<Option<Index>> {
    let origin = src.tell();

    let built = match mode {
        IndexMode::Off => return Ok(None),
        IndexMode::Embedded => {
            if !header.has_embedded_index() {
                debug!("No embedded index declared");
                return Ok(None);
            }
            read_index_chain(src, u64::from(header.index_offset))
        }
        IndexMode::Generate => scan_data_chunks(src, header.data_offset),
    };

    match built {
        Ok(index) => {
            src.seek(origin)?;
            info!(
                "Built {:?} index: {} streams, {} entries",
                index.source(),
                index.stream_count(),
                index.total_entries()
            );
            Ok(Some(index))
        }
        Err(e) => {
            warn!("Index unavailable ({} mode): {}", mode, e);
            src.reset()?;
            src.seek(origin)?;
            Ok(None)
        }
    }
}
