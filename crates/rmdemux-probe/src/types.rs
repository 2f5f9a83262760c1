//! Probe result types

use serde::Serialize;
use std::fmt;

/// Summary of a probed RealMedia file
#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    /// Path to the probed file
    pub file_path: String,
    /// File size in bytes
    pub file_size: u64,
    /// Container format (e.g., "RealMedia")
    pub container: String,
    /// Duration in milliseconds, from the properties chunk
    pub duration_ms: Option<u64>,
    /// Average bitrate of the whole file in bits per second
    pub bitrate: Option<u32>,
    /// Declared packet count. `None` when the file does not declare one.
    pub packet_count: Option<u32>,
    /// Offset of the first index chunk, if the file carries one
    pub index_offset: Option<u32>,
    /// Content description as `(key, value)` pairs
    pub metadata: Vec<(String, String)>,
    /// Video tracks in the file
    pub video_tracks: Vec<VideoTrack>,
    /// Audio tracks in the file
    pub audio_tracks: Vec<AudioTrack>,
    /// Declared streams that cannot be demuxed
    pub skipped: Vec<SkippedTrack>,
}

impl MediaInfo {
    /// Whether the file carries an index written by the muxer
    pub fn has_index(&self) -> bool {
        self.index_offset.is_some()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_ms.map(|ms| ms as f64 / 1000.0)
    }
}

/// Video track information
#[derive(Debug, Clone, Serialize)]
pub struct VideoTrack {
    /// Stream number within the file
    pub stream_id: u16,
    /// Effective FourCC (e.g., "RV20")
    pub codec: String,
    /// Human readable codec name
    pub codec_name: String,
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate
    pub frame_rate: Option<f64>,
    /// Average bitrate in bits per second
    pub bitrate: u32,
}

/// Audio track information
#[derive(Debug, Clone, Serialize)]
pub struct AudioTrack {
    /// Stream number within the file
    pub stream_id: u16,
    /// Codec identity (e.g., "sipr", "dnet")
    pub codec: String,
    /// Human readable codec name
    pub codec_name: String,
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Codec frame size in bytes
    pub frame_size: u16,
    pub block_align: u16,
    /// Average bitrate in bits per second
    pub bitrate: u32,
}

/// A declared stream that was left out
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTrack {
    pub stream_id: u16,
    pub reason: String,
}

impl fmt::Display for VideoTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}) {}x{}",
            self.stream_id, self.codec, self.codec_name, self.width, self.height
        )?;
        if let Some(fps) = self.frame_rate {
            write!(f, " @ {:.3} fps", fps)?;
        }
        Ok(())
    }
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}) {}ch {}Hz",
            self.stream_id, self.codec, self.codec_name, self.channels, self.sample_rate
        )
    }
}
