//! Index generation by scanning packet headers.

use super::{Index, IndexEntry, IndexSource};
use crate::rmf::{ChunkRead, FourCc, CHUNK_HEADER_SIZE, PACKET_HEADER_SIZE};
use crate::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Scan the chain of `DATA` chunks and index every packet.
///
/// `data_offset` is the header's data offset, which points just past the
/// first chunk's header. Each `DATA` chunk declares how many packets it
/// holds and where the next one starts (0 for none). Packets are numbered
/// with a running counter across chunks.
///
/// End of stream or a packet shorter than its own header aborts the scan.
pub fn scan_data_chunks<S: ChunkRead + ?Sized>(src: &mut S, data_offset: u64) -> Result<Index> {
    let mut index = Index::new(IndexSource::Generated);
    let mut visited = HashSet::new();
    let mut chunk_offset = data_offset.saturating_sub(u64::from(CHUNK_HEADER_SIZE));
    let mut packet_no: u32 = 0;

    loop {
        if !visited.insert(chunk_offset) {
            warn!("Data chunk chain loops back to {:#x}", chunk_offset);
            break;
        }

        src.seek(chunk_offset)?;
        let tag = match src.read_fourcc() {
            Ok(tag) => tag,
            Err(e) if e.is_eof() => return Err(Error::DataChunkNotFound(chunk_offset)),
            Err(e) => return Err(e),
        };
        if tag != FourCc::DATA {
            if visited.len() == 1 {
                return Err(Error::DataChunkNotFound(chunk_offset));
            }
            warn!("Expected DATA chunk at {:#x}, found {}", chunk_offset, tag);
            break;
        }

        // Size and version.
        src.skip(4 + 2)?;
        let count = src.read_u32()?;
        let next = src.read_u32()?;
        info!(
            "Generating index from DATA chunk at {:#x}: {} packets",
            chunk_offset, count
        );

        for _ in 0..count {
            let offset = src.tell();
            src.skip(2)?;
            let length = src.read_u16()?;
            if length < PACKET_HEADER_SIZE {
                return Err(Error::InvalidPacket { offset, length });
            }
            let stream_id = src.read_u16()?;
            let timestamp = src.read_u32()?;
            src.skip(1)?;
            let flags = src.read_u8()?;

            index.push(
                stream_id,
                IndexEntry {
                    timestamp,
                    offset,
                    packet_no,
                    length: Some(length),
                    flags: Some(flags),
                },
            );
            packet_no = packet_no.wrapping_add(1);
            src.skip(u64::from(length - PACKET_HEADER_SIZE))?;
        }

        if next == 0 {
            break;
        }
        debug!("Following DATA chain to {:#x}", next);
        chunk_offset = u64::from(next);
    }

    Ok(index)
}
