//! RealMedia chunk tags and chunk headers.

use super::reader::ChunkRead;
use super::CHUNK_HEADER_SIZE;
use crate::{Error, Result};

/// Four-character code as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const RMF: Self = Self(*b".RMF");
    pub const PROP: Self = Self(*b"PROP");
    pub const CONT: Self = Self(*b"CONT");
    pub const MDPR: Self = Self(*b"MDPR");
    pub const DATA: Self = Self(*b"DATA");
    pub const INDX: Self = Self(*b"INDX");
    /// Marker at the start of an audio type-specific block.
    pub const AUDIO_MARKER: Self = Self(*b".ra\xfd");
    /// Marker inside a video type-specific block.
    pub const VIDO: Self = Self(*b"VIDO");
    pub const RV10: Self = Self(*b"RV10");
    pub const RV13: Self = Self(*b"RV13");
    pub const RV20: Self = Self(*b"RV20");
    pub const RV30: Self = Self(*b"RV30");
    pub const RV40: Self = Self(*b"RV40");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The tag packed little-endian, the way fourcc values are compared and
    /// stored in format records.
    pub fn packed(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for FourCc {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Top-level chunk kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkTag {
    /// `PROP`: global file properties.
    Properties,
    /// `CONT`: content description (title, author, ...).
    Content,
    /// `MDPR`: media properties of one stream.
    MediaProperties,
    /// `DATA`: start of the packet region.
    Data,
    /// `INDX`: index chunk.
    Index,
    Unknown(FourCc),
}

impl ChunkTag {
    pub fn from_fourcc(tag: FourCc) -> Self {
        match tag {
            FourCc::PROP => Self::Properties,
            FourCc::CONT => Self::Content,
            FourCc::MDPR => Self::MediaProperties,
            FourCc::DATA => Self::Data,
            FourCc::INDX => Self::Index,
            other => Self::Unknown(other),
        }
    }

    pub fn fourcc(&self) -> FourCc {
        match self {
            Self::Properties => FourCc::PROP,
            Self::Content => FourCc::CONT,
            Self::MediaProperties => FourCc::MDPR,
            Self::Data => FourCc::DATA,
            Self::Index => FourCc::INDX,
            Self::Unknown(tag) => *tag,
        }
    }
}

impl std::fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

/// Parsed chunk header: tag, size and object version.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    /// Chunk kind.
    pub tag: ChunkTag,
    /// File offset of the chunk's first byte.
    pub offset: u64,
    /// Chunk size including the 10-byte header.
    pub size: u32,
    /// Object version.
    pub version: u16,
}

impl ChunkHeader {
    /// Read a chunk header at the current position.
    ///
    /// A declared size below the header size is rejected: the walk cannot
    /// locate the next chunk from it.
    pub fn read<S: ChunkRead + ?Sized>(src: &mut S) -> Result<Self> {
        let offset = src.tell();
        let tag = ChunkTag::from_fourcc(src.read_fourcc()?);
        let size = src.read_u32()?;
        let version = src.read_u16()?;

        if size < CHUNK_HEADER_SIZE {
            return Err(Error::InvalidChunk {
                tag: tag.to_string(),
                offset,
                size,
            });
        }

        Ok(Self {
            tag,
            offset,
            size,
            version,
        })
    }

    /// Size of the chunk body after the header.
    pub fn body_size(&self) -> u32 {
        self.size - CHUNK_HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::IoSource;
    use std::io::Cursor;

    #[test]
    fn test_chunk_tag_dispatch() {
        assert_eq!(ChunkTag::from_fourcc(FourCc(*b"PROP")), ChunkTag::Properties);
        assert_eq!(ChunkTag::from_fourcc(FourCc(*b"DATA")), ChunkTag::Data);
        assert_eq!(
            ChunkTag::from_fourcc(FourCc(*b"RJMD")),
            ChunkTag::Unknown(FourCc(*b"RJMD"))
        );
        assert_eq!(ChunkTag::Index.fourcc(), FourCc::INDX);
    }

    #[test]
    fn test_fourcc_display_escapes() {
        assert_eq!(FourCc::RV10.to_string(), "RV10");
        assert_eq!(FourCc::AUDIO_MARKER.to_string(), ".ra\\xfd");
    }

    #[test]
    fn test_packed_value() {
        // 'd' | 'n' << 8 | 'e' << 16 | 't' << 24
        assert_eq!(FourCc(*b"dnet").packed(), 0x7465_6e64);
    }

    #[test]
    fn test_read_chunk_header() {
        let bytes = vec![b'C', b'O', b'N', b'T', 0, 0, 0, 18, 0, 0];
        let mut src = IoSource::new(Cursor::new(bytes)).unwrap();
        let chunk = ChunkHeader::read(&mut src).unwrap();
        assert_eq!(chunk.tag, ChunkTag::Content);
        assert_eq!(chunk.size, 18);
        assert_eq!(chunk.body_size(), 8);
        assert_eq!(chunk.offset, 0);
    }

    #[test]
    fn test_undersized_chunk_rejected() {
        let bytes = vec![b'P', b'R', b'O', b'P', 0, 0, 0, 9, 0, 0];
        let mut src = IoSource::new(Cursor::new(bytes)).unwrap();
        let err = ChunkHeader::read(&mut src).unwrap_err();
        assert!(matches!(err, Error::InvalidChunk { size: 9, .. }));
    }
}
