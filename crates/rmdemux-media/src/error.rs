//! Error types for rmdemux-media.

use std::io;
use thiserror::Error;

use crate::rmf::StreamKind;

/// Result type for rmdemux-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for rmdemux-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte source ran out of data.
    ///
    /// This is the end-of-stream sentinel returned by every primitive read.
    /// Callers in the steady-state pull loop turn it into a clean
    /// end-of-stream result.
    #[error("Unexpected end of stream")]
    Eof,

    /// The file does not start with the `.RMF` magic.
    #[error("Not a RealMedia file (magic {0:02x?})")]
    NotRealMedia([u8; 4]),

    /// Invalid file header structure.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A top-level chunk declared an impossible size.
    #[error("Invalid chunk {tag} at offset {offset}: size {size}")]
    InvalidChunk { tag: String, offset: u64, size: u32 },

    /// The header walk ended without reaching the data chunk.
    #[error("Missing DATA chunk after header section")]
    MissingDataChunk,

    /// No index chunk at the declared index offset.
    #[error("No index chunk found at offset {0}")]
    IndexNotFound(u64),

    /// No data chunk at the offset used for index generation.
    #[error("No data chunk found at offset {0}")]
    DataChunkNotFound(u64),

    /// A packet header declared a length shorter than the header itself.
    #[error("Invalid packet at offset {offset}: length {length}")]
    InvalidPacket { offset: u64, length: u16 },

    /// The stream registry has no free slot for this kind of stream.
    #[error("Stream registry full: {kind} capacity is {capacity}")]
    RegistryFull { kind: StreamKind, capacity: usize },

    /// A stream with this identifier is already registered.
    #[error("Duplicate stream id {0}")]
    DuplicateStream(u16),

    /// Too many malformed packets in a single pull.
    #[error("Gave up resynchronizing after {0} malformed packets")]
    ResyncLimit(u32),

    /// Seeking is not possible in the current session state.
    #[error("Not seekable: {0}")]
    NotSeekable(&'static str),

    /// The seek target lies beyond the index.
    #[error("Seek target out of range: {0}")]
    SeekOutOfRange(String),
}

impl Error {
    /// Create an invalid header error.
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Create a seek out of range error.
    pub fn seek_out_of_range(msg: impl Into<String>) -> Self {
        Self::SeekOutOfRange(msg.into())
    }

    /// Whether this is the end-of-stream sentinel.
    pub fn is_eof(&self) -> bool {
        match self {
            Self::Eof => true,
            Self::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
