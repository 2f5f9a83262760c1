//! Container format detection and parsing

pub mod realmedia;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::error::ProbeError;

/// Container formats recognized by their magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// RealMedia (.rm, .rmvb, .rv)
    RealMedia,
    /// Bare RealAudio stream (.ra). Recognized but not demuxed.
    RealAudio,
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::RealMedia => write!(f, "RealMedia"),
            Container::RealAudio => write!(f, "RealAudio"),
        }
    }
}

/// Detect container format from file magic bytes
pub fn detect_container(path: &Path) -> Result<Container, ProbeError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProbeError::FileNotFound(path.to_path_buf())
        } else {
            ProbeError::Io(e)
        }
    })?;

    let mut reader = BufReader::new(file);
    detect_container_from_reader(&mut reader)
}

/// Detect container format from a reader
pub fn detect_container_from_reader<R: Read + Seek>(
    reader: &mut R,
) -> Result<Container, ProbeError> {
    let mut magic = [0u8; 4];
    let read = reader.read_exact(&mut magic);

    // Reset reader position
    reader.rewind()?;

    match read {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProbeError::UnsupportedContainer(
                "File too short to carry a magic".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    match &magic {
        b".RMF" => Ok(Container::RealMedia),
        b".ra\xfd" => Ok(Container::RealAudio),
        _ => Err(ProbeError::UnsupportedContainer(
            "Unable to detect container format from magic bytes".to_string(),
        )),
    }
}

/// Get container type from file extension (fallback)
pub fn container_from_extension(path: &Path) -> Option<Container> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "rm" | "rmvb" | "rv" => Some(Container::RealMedia),
        "ra" => Some(Container::RealAudio),
        _ => None,
    }
}
