//! Stream descriptors built from media-properties blocks.

use super::codec::{video_codec_name, AudioCodec};
use super::format::{BitmapInfoHeader, WaveFormat};
use super::FourCc;

/// Elementary stream kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum StreamKind {
    Audio,
    Video,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio-specific stream properties.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct AudioStream {
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub codec: AudioCodec,
    /// Codec identity as declared in the stream header.
    pub identity: FourCc,
    /// Audio header version (4 or 5).
    pub header_version: u16,
    pub sample_rate: u16,
    pub channels: u16,
    pub frame_size: u16,
    pub wave_format: WaveFormat,
}

impl AudioStream {
    /// Whether payloads of this stream are delivered with byte pairs swapped.
    pub fn needs_byte_swap(&self) -> bool {
        self.codec.swaps_bytes()
    }
}

/// Video-specific stream properties.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct VideoStream {
    /// Effective codec tag after sub-id disambiguation.
    pub fourcc: FourCc,
    /// Codec tag as declared in the stream header.
    pub nominal_fourcc: FourCc,
    pub sub_id: u32,
    pub width: u16,
    pub height: u16,
    /// Nominal frames per second.
    pub fps: u16,
    /// Nominal frame duration in seconds. `None` when the header declares 0 fps.
    pub frame_duration: Option<f64>,
    pub bitmap_info: BitmapInfoHeader,
}

impl VideoStream {
    pub fn codec_name(&self) -> &'static str {
        video_codec_name(self.fourcc)
    }
}

/// Kind-specific part of a stream descriptor.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(tag = "kind", rename_all = "lowercase"))]
pub enum StreamMedia {
    Audio(AudioStream),
    Video(VideoStream),
}

/// A registered elementary stream.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct StreamDescriptor {
    /// Stream identifier used by data packets.
    pub id: u16,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    pub max_packet_size: u32,
    pub avg_packet_size: u32,
    pub start_time_ms: u32,
    pub preroll_ms: u32,
    pub duration_ms: u32,
    /// Stream description string.
    pub name: String,
    pub mime_type: String,
    pub media: StreamMedia,
}

impl StreamDescriptor {
    pub fn kind(&self) -> StreamKind {
        match self.media {
            StreamMedia::Audio(_) => StreamKind::Audio,
            StreamMedia::Video(_) => StreamKind::Video,
        }
    }

    /// Codec tag: the audio identity or the effective video fourcc.
    pub fn codec_tag(&self) -> FourCc {
        match &self.media {
            StreamMedia::Audio(a) => a.identity,
            StreamMedia::Video(v) => v.fourcc,
        }
    }

    pub fn codec_name(&self) -> &'static str {
        match &self.media {
            StreamMedia::Audio(a) => a.codec.description(),
            StreamMedia::Video(v) => v.codec_name(),
        }
    }

    pub fn as_audio(&self) -> Option<&AudioStream> {
        match &self.media {
            StreamMedia::Audio(a) => Some(a),
            StreamMedia::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoStream> {
        match &self.media {
            StreamMedia::Video(v) => Some(v),
            StreamMedia::Audio(_) => None,
        }
    }
}
