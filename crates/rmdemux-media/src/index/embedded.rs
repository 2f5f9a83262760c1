//! Reader for the `INDX` chunk chain.
//!
//! Layout of one chunk:
//!
//! ```text
//! tag "INDX" | size u32 | version u16 | entries u32 | stream u16 | next u32
//! entries × (version u16 | timestamp u32 | offset u32 | packet u32)
//! ```

use super::{Index, IndexEntry, IndexSource};
use crate::rmf::{ChunkRead, FourCc};
use crate::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Upper bound on entries preallocated from an untrusted count.
const MAX_PREALLOC: usize = 1 << 16;

struct IndexChunk {
    stream_id: u16,
    entries: Vec<IndexEntry>,
    next: u32,
}

/// Follow the chain starting at `first_offset`.
///
/// The chain ends at a zero next offset, at a chunk that is not `INDX`, at
/// end of stream, or when an offset repeats. Only a failure at the first
/// chunk is an error.
pub fn read_index_chain<S: ChunkRead + ?Sized>(src: &mut S, first_offset: u64) -> Result<Index> {
    let mut index = Index::new(IndexSource::Embedded);
    let mut visited = HashSet::new();
    let mut offset = first_offset;

    while offset != 0 {
        if !visited.insert(offset) {
            warn!("Index chain loops back to {:#x}", offset);
            break;
        }

        match read_index_chunk(src, offset) {
            Ok(chunk) => {
                debug!(
                    "INDX at {:#x}: stream {} with {} entries, next {:#x}",
                    offset,
                    chunk.stream_id,
                    chunk.entries.len(),
                    chunk.next
                );
                index.extend(chunk.stream_id, chunk.entries);
                offset = u64::from(chunk.next);
            }
            Err(e) if visited.len() == 1 => return Err(e),
            Err(e) => {
                warn!("Index chain ends early at {:#x}: {}", offset, e);
                break;
            }
        }
    }

    info!(
        "Read embedded index: {} chunks, {} entries",
        visited.len(),
        index.total_entries()
    );
    Ok(index)
}

fn read_index_chunk<S: ChunkRead + ?Sized>(src: &mut S, offset: u64) -> Result<IndexChunk> {
    src.seek(offset)?;

    let tag = match src.read_fourcc() {
        Ok(tag) => tag,
        Err(e) if e.is_eof() => return Err(Error::IndexNotFound(offset)),
        Err(e) => return Err(e),
    };
    if tag != FourCc::INDX {
        return Err(Error::IndexNotFound(offset));
    }

    let _size = src.read_u32()?;
    let version = src.read_u16()?;
    if version != 0 {
        warn!("INDX at {:#x}: unexpected version {}", offset, version);
    }
    let count = src.read_u32()?;
    let stream_id = src.read_u16()?;
    let next = src.read_u32()?;

    let mut entries = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
    for _ in 0..count {
        src.skip(2)?;
        let timestamp = src.read_u32()?;
        let entry_offset = src.read_u32()?;
        let packet_no = src.read_u32()?;
        entries.push(IndexEntry {
            timestamp,
            offset: u64::from(entry_offset),
            packet_no,
            length: None,
            flags: None,
        });
    }

    Ok(IndexChunk {
        stream_id,
        entries,
        next,
    })
}
