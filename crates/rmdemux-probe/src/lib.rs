//! # rmdemux-probe
//!
//! Quick inspection of RealMedia files.
//!
//! Detects the container from its magic bytes and summarizes the header
//! section: duration, bitrate, content description and the streams that can
//! be demuxed. Packets are never read.
//!
//! ## Example
//!
//! ```no_run
//! let info = rmdemux_probe::probe_file("clip.rm").unwrap();
//!
//! println!("Container: {}", info.container);
//! println!("Duration: {:?}ms", info.duration_ms);
//!
//! for video in &info.video_tracks {
//!     println!("Video: {} {}x{}", video.codec, video.width, video.height);
//! }
//!
//! for audio in &info.audio_tracks {
//!     println!("Audio: {} {}ch {}Hz", audio.codec, audio.channels, audio.sample_rate);
//! }
//! ```

pub mod container;
pub mod error;
pub mod types;

pub use container::Container;
pub use error::ProbeError;
pub use types::*;

use std::path::Path;

/// Probe a media file and extract its stream summary
///
/// The container is detected from the magic bytes, falling back to the
/// file extension.
///
/// # Example
///
/// ```no_run
/// let info = rmdemux_probe::probe_file("/path/to/clip.rmvb").unwrap();
/// println!("Found {} video tracks", info.video_tracks.len());
/// ```
pub fn probe_file<P: AsRef<Path>>(path: P) -> Result<MediaInfo, ProbeError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    let container_type = container::detect_container(path).or_else(|_| {
        container::container_from_extension(path)
            .ok_or_else(|| ProbeError::UnsupportedContainer("Unknown".to_string()))
    })?;

    match container_type {
        Container::RealMedia => container::realmedia::probe(path),
        Container::RealAudio => Err(ProbeError::UnsupportedContainer(
            "bare RealAudio streams are not demuxed".to_string(),
        )),
    }
}

/// Probe a media file held in memory
pub fn probe_bytes(data: &[u8], container_hint: Option<Container>) -> Result<MediaInfo, ProbeError> {
    use std::io::Cursor;

    let container_type = match container_hint {
        Some(hint) => hint,
        None => container::detect_container_from_reader(&mut Cursor::new(data))?,
    };

    match container_type {
        Container::RealMedia => container::realmedia::probe_reader(Cursor::new(data)),
        Container::RealAudio => Err(ProbeError::UnsupportedContainer(
            "bare RealAudio streams are not demuxed".to_string(),
        )),
    }
}

/// Check the magic bytes of a file without parsing it
pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        container::detect_container(path.as_ref()),
        Ok(Container::RealMedia)
    )
}

/// Get the detected container format for a file
pub fn detect_container<P: AsRef<Path>>(path: P) -> Result<Container, ProbeError> {
    container::detect_container(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_missing_file() {
        let result = probe_file("/nonexistent/clip.rm");
        assert!(matches!(result, Err(ProbeError::FileNotFound(_))));
    }

    #[test]
    fn test_probe_bytes_rejects_garbage() {
        let result = probe_bytes(b"RIFF\0\0\0\0WAVE", None);
        assert!(matches!(result, Err(ProbeError::UnsupportedContainer(_))));
    }

    #[test]
    fn test_real_audio_not_demuxed() {
        let result = probe_bytes(b".ra\xfd\0\x04", None);
        assert!(matches!(result, Err(ProbeError::UnsupportedContainer(_))));
    }
}
