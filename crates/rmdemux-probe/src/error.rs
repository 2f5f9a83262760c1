//! Error types for rmdemux-probe

use std::path::PathBuf;

/// Errors that can occur while probing
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported container format
    #[error("Unsupported container format: {0}")]
    UnsupportedContainer(String),

    /// Failed to parse container
    #[error("Failed to parse container: {0}")]
    ContainerParse(String),
}

impl From<rmdemux_media::Error> for ProbeError {
    fn from(err: rmdemux_media::Error) -> Self {
        match err {
            rmdemux_media::Error::Io(e) => ProbeError::Io(e),
            rmdemux_media::Error::NotRealMedia(magic) => {
                ProbeError::UnsupportedContainer(format!("bad magic {:02x?}", magic))
            }
            other => ProbeError::ContainerParse(other.to_string()),
        }
    }
}
