//! Header section parser.
//!
//! Walks the top-level chunks from the `.RMF` magic up to the first `DATA`
//! chunk, collecting global properties, content metadata and one stream
//! descriptor per supported `MDPR`. The walk is forward-only: on success the
//! source is left at the first packet header.

use super::chunks::{ChunkHeader, ChunkTag, FourCc};
use super::codec::{AudioCodec, VideoSubId};
use super::format::{BitmapInfoHeader, WaveFormat};
use super::reader::{ChunkRead, StrLen};
use super::registry::StreamRegistry;
use super::stream::{AudioStream, StreamDescriptor, StreamMedia, VideoStream};
use super::CHUNK_HEADER_SIZE;
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Bytes skipped in the audio header between the version and the frame size.
const AUDIO_V4_PREAMBLE: u64 = 2 + 4 + 4 + 2 + 4 + 2 + 4 + 4 + 4 + 4 + 2;

/// Buffer size for the v4 codec identity string.
const IDENTITY_BUF: usize = 128;

/// Cap for stream description and mime type strings.
const DESCRIPTION_CAP: usize = 255;

/// Cap for content metadata strings.
const CONTENT_CAP: usize = 4096;

/// Declared packet count of the first data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketCount {
    Known(u32),
    /// Zero on the wire; packets are read until end of stream.
    Unknown,
}

impl PacketCount {
    pub fn from_declared(count: u32) -> Self {
        if count == 0 {
            Self::Unknown
        } else {
            Self::Known(count)
        }
    }

    pub fn known(&self) -> Option<u32> {
        match self {
            Self::Known(n) => Some(*n),
            Self::Unknown => None,
        }
    }
}

/// `PROP` flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyFlags(pub u16);

impl PropertyFlags {
    pub fn save_allowed(&self) -> bool {
        self.0 & 0x1 != 0
    }

    pub fn perfect_play(&self) -> bool {
        self.0 & 0x2 != 0
    }

    pub fn live_broadcast(&self) -> bool {
        self.0 & 0x4 != 0
    }
}

/// Global file properties from the `PROP` chunk.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    pub max_packet_size: u32,
    pub avg_packet_size: u32,
    pub num_packets: u32,
    pub duration_ms: u32,
    pub preroll_ms: u32,
    pub index_offset: u32,
    /// Data chunk offset as stored on the wire.
    pub data_offset: u32,
    pub num_streams: u16,
    pub flags: PropertyFlags,
}

/// Content description from the `CONT` chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub comment: Option<String>,
}

impl ContentInfo {
    /// Non-empty fields as `(key, value)` pairs.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.title),
            ("author", &self.author),
            ("copyright", &self.copyright),
            ("comment", &self.comment),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}

/// Why a declared stream was left out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Audio codec that is not demuxed.
    UnsupportedCodec(FourCc),
    /// Type-specific block is neither audio nor `VIDO`.
    NotAudioOrVideo(FourCc),
    /// The registry refused the stream.
    Rejected(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedCodec(tag) => write!(f, "unsupported audio codec {}", tag),
            Self::NotAudioOrVideo(tag) => write!(f, "not an audio or video stream ({})", tag),
            Self::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

/// A declared stream that was not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStream {
    pub id: u16,
    pub reason: SkipReason,
}

/// Everything learned from the header section.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    pub header_size: u32,
    pub object_version: u16,
    pub file_version: u32,
    /// Declared number of header chunks, the file header included.
    pub header_count: u32,
    pub properties: Option<Properties>,
    pub content: ContentInfo,
    /// Offset of the first `INDX` chunk, 0 if none.
    pub index_offset: u32,
    /// Stored data chunk offset plus the chunk header size.
    pub data_offset: u64,
    pub total_packets: PacketCount,
    /// Offset of the next `DATA` chunk, 0 if none.
    pub next_data_offset: u32,
    /// Position of the first packet header.
    pub first_packet_offset: u64,
    pub skipped_streams: Vec<SkippedStream>,
}

impl ContainerHeader {
    fn new(header_size: u32, object_version: u16, file_version: u32, header_count: u32) -> Self {
        Self {
            header_size,
            object_version,
            file_version,
            header_count,
            properties: None,
            content: ContentInfo::default(),
            index_offset: 0,
            data_offset: 0,
            total_packets: PacketCount::Unknown,
            next_data_offset: 0,
            first_packet_offset: 0,
            skipped_streams: Vec::new(),
        }
    }

    /// Duration in seconds, when a `PROP` chunk declared one.
    pub fn duration_secs(&self) -> Option<f64> {
        self.properties
            .as_ref()
            .filter(|p| p.duration_ms > 0)
            .map(|p| f64::from(p.duration_ms) / 1000.0)
    }

    pub fn has_embedded_index(&self) -> bool {
        self.index_offset != 0
    }
}

/// Parse the header section from the start of `src`.
///
/// Returns the header and the registry of supported streams, with the source
/// positioned at the first packet header.
pub fn parse_header<S: ChunkRead + ?Sized>(
    src: &mut S,
    max_streams: usize,
) -> Result<(ContainerHeader, StreamRegistry)> {
    HeaderParser {
        src,
        registry: StreamRegistry::with_capacity(max_streams),
    }
    .parse()
}

struct HeaderParser<'a, S: ?Sized> {
    src: &'a mut S,
    registry: StreamRegistry,
}

impl<'a, S: ChunkRead + ?Sized> HeaderParser<'a, S> {
    fn parse(mut self) -> Result<(ContainerHeader, StreamRegistry)> {
        let magic = self.src.read_fourcc()?;
        if magic != FourCc::RMF {
            return Err(Error::NotRealMedia(magic.0));
        }

        let header_size = self.src.read_u32()?;
        let object_version = self.src.read_u16()?;
        let file_version = self.src.read_u32()?;
        let header_count = self.src.read_u32()?;
        debug!(
            "RMF header: size={} object_version={} file_version={} headers={}",
            header_size, object_version, file_version, header_count
        );

        let mut header = ContainerHeader::new(header_size, object_version, file_version, header_count);

        let mut reached_data = false;
        for _ in 1..header_count {
            let chunk = ChunkHeader::read(&mut *self.src)?;
            debug!(
                "Chunk {} at {:#x}: size={} version={}",
                chunk.tag, chunk.offset, chunk.size, chunk.version
            );

            match chunk.tag {
                ChunkTag::Properties => self.parse_properties(&mut header)?,
                ChunkTag::Content => self.parse_content(&mut header)?,
                ChunkTag::MediaProperties => self.parse_media_properties(&mut header)?,
                ChunkTag::Data => {
                    reached_data = true;
                    break;
                }
                ChunkTag::Index | ChunkTag::Unknown(_) => {
                    debug!("Skipping {} chunk ({} bytes)", chunk.tag, chunk.body_size());
                    self.src.skip(u64::from(chunk.body_size()))?;
                }
            }
        }

        if !reached_data {
            let chunk = match ChunkHeader::read(&mut *self.src) {
                Ok(chunk) => chunk,
                Err(e) if e.is_eof() => return Err(Error::MissingDataChunk),
                Err(e) => return Err(e),
            };
            if chunk.tag != ChunkTag::Data {
                warn!("Expected DATA chunk at {:#x}, found {}", chunk.offset, chunk.tag);
                return Err(Error::MissingDataChunk);
            }
        }

        let declared = self.src.read_u32()?;
        header.total_packets = PacketCount::from_declared(declared);
        header.next_data_offset = self.src.read_u32()?;
        header.first_packet_offset = self.src.tell();

        info!(
            "RealMedia header parsed: {} audio, {} video streams, {} packets",
            self.registry.audio_ids().len(),
            self.registry.video_ids().len(),
            header
                .total_packets
                .known()
                .map_or_else(|| "unknown".to_string(), |n| n.to_string()),
        );

        Ok((header, self.registry))
    }

    fn parse_properties(&mut self, header: &mut ContainerHeader) -> Result<()> {
        let src = &mut *self.src;
        let props = Properties {
            max_bitrate: src.read_u32()?,
            avg_bitrate: src.read_u32()?,
            max_packet_size: src.read_u32()?,
            avg_packet_size: src.read_u32()?,
            num_packets: src.read_u32()?,
            duration_ms: src.read_u32()?,
            preroll_ms: src.read_u32()?,
            index_offset: src.read_u32()?,
            data_offset: src.read_u32()?,
            num_streams: src.read_u16()?,
            flags: PropertyFlags(src.read_u16()?),
        };

        debug!(
            "PROP: duration={}ms packets={} index={:#x} data={:#x} streams={} flags={:#x}",
            props.duration_ms,
            props.num_packets,
            props.index_offset,
            props.data_offset,
            props.num_streams,
            props.flags.0
        );

        header.index_offset = props.index_offset;
        header.data_offset = u64::from(props.data_offset) + u64::from(CHUNK_HEADER_SIZE);
        header.properties = Some(props);
        Ok(())
    }

    fn parse_content(&mut self, header: &mut ContainerHeader) -> Result<()> {
        let mut field = || -> Result<Option<String>> {
            let s = self.src.read_string(StrLen::Word, CONTENT_CAP)?;
            Ok(if s.is_empty() { None } else { Some(s) })
        };

        header.content = ContentInfo {
            title: field()?,
            author: field()?,
            copyright: field()?,
            comment: field()?,
        };

        for (key, value) in header.content.pairs() {
            info!("Clip info: {}: {}", key, value);
        }
        Ok(())
    }

    fn parse_media_properties(&mut self, header: &mut ContainerHeader) -> Result<()> {
        let id = self.src.read_u16()?;
        let max_bitrate = self.src.read_u32()?;
        let avg_bitrate = self.src.read_u32()?;
        let max_packet_size = self.src.read_u32()?;
        let avg_packet_size = self.src.read_u32()?;
        let start_time_ms = self.src.read_u32()?;
        let preroll_ms = self.src.read_u32()?;
        let duration_ms = self.src.read_u32()?;
        let name = self.src.read_string(StrLen::Byte, DESCRIPTION_CAP)?;
        let mime_type = self.src.read_string(StrLen::Byte, DESCRIPTION_CAP)?;

        let type_len = u64::from(self.src.read_u32()?);
        let type_start = self.src.tell();
        debug!(
            "MDPR: stream={} \"{}\" ({}) type-specific {} bytes",
            id, name, mime_type, type_len
        );

        let media = self.parse_type_specific(id, avg_bitrate, header)?;

        // The type-specific block is bounded by its declared length.
        let consumed = self.src.tell() - type_start;
        if consumed < type_len {
            self.src.skip(type_len - consumed)?;
        } else if consumed > type_len {
            warn!(
                "Stream {}: type-specific data overran its {} bytes by {}",
                id,
                type_len,
                consumed - type_len
            );
            self.src.seek(type_start + type_len)?;
        }

        let Some(media) = media else {
            return Ok(());
        };

        let stream = StreamDescriptor {
            id,
            max_bitrate,
            avg_bitrate,
            max_packet_size,
            avg_packet_size,
            start_time_ms,
            preroll_ms,
            duration_ms,
            name,
            mime_type,
            media,
        };
        let kind = stream.kind();
        let tag = stream.codec_tag();

        match self.registry.register(stream) {
            Ok(slot) => info!("Registered {} stream {} ({}) in slot {}", kind, id, tag, slot),
            Err(e) => {
                warn!("Dropping {} stream {}: {}", kind, id, e);
                header.skipped_streams.push(SkippedStream {
                    id,
                    reason: SkipReason::Rejected(e.to_string()),
                });
            }
        }
        Ok(())
    }

    fn parse_type_specific(
        &mut self,
        id: u16,
        avg_bitrate: u32,
        header: &mut ContainerHeader,
    ) -> Result<Option<StreamMedia>> {
        let marker = self.src.read_fourcc()?;
        if marker == FourCc::AUDIO_MARKER {
            return Ok(self
                .parse_audio(id, avg_bitrate, header)?
                .map(StreamMedia::Audio));
        }
        Ok(self.parse_video(id, header)?.map(StreamMedia::Video))
    }

    fn parse_audio(
        &mut self,
        id: u16,
        avg_bitrate: u32,
        header: &mut ContainerHeader,
    ) -> Result<Option<AudioStream>> {
        let version = self.src.read_u16()?;
        if version != 4 && version != 5 {
            warn!("Stream {}: unexpected audio header version {}", id, version);
        }

        self.src.skip(AUDIO_V4_PREAMBLE)?;
        let frame_size = self.src.read_u16()?;
        self.src.skip(4)?;
        if version == 5 {
            self.src.skip(6)?;
        }
        let sample_rate = self.src.read_u16()?;
        self.src.skip(4)?;
        let channels = self.src.read_u16()?;

        let identity = if version == 5 {
            self.src.skip(4)?;
            self.src.read_fourcc()?
        } else {
            self.src.skip_str(StrLen::Byte)?;
            let mut buf = [0u8; IDENTITY_BUF];
            self.src.read_str_into(StrLen::Byte, &mut buf)?;
            FourCc([buf[0], buf[1], buf[2], buf[3]])
        };

        let codec = AudioCodec::from_identity(identity);
        debug!(
            "Audio stream {}: v{} {} Hz, {} ch, frame size {}, codec {}",
            id, version, sample_rate, channels, frame_size, identity
        );

        if !codec.is_registered() {
            warn!("Stream {}: {} ({}) is not supported", id, codec.description(), identity);
            header.skipped_streams.push(SkippedStream {
                id,
                reason: SkipReason::UnsupportedCodec(identity),
            });
            return Ok(None);
        }

        info!("Audio stream {}: {}", id, codec.description());
        let wave_format = WaveFormat::for_codec(&codec, channels, sample_rate, avg_bitrate, frame_size);

        Ok(Some(AudioStream {
            codec,
            identity,
            header_version: version,
            sample_rate,
            channels,
            frame_size,
            wave_format,
        }))
    }

    /// The first dword of a video block is consumed by the caller's marker
    /// check; `VIDO` follows it.
    fn parse_video(&mut self, id: u16, header: &mut ContainerHeader) -> Result<Option<VideoStream>> {
        let tag = self.src.read_fourcc()?;
        if tag != FourCc::VIDO {
            warn!("Stream {}: not an audio or video stream ({})", id, tag);
            header.skipped_streams.push(SkippedStream {
                id,
                reason: SkipReason::NotAudioOrVideo(tag),
            });
            return Ok(None);
        }

        let nominal_fourcc = self.src.read_fourcc()?;
        let width = self.src.read_u16()?;
        let height = self.src.read_u16()?;
        let fps = self.src.read_u16()?;
        self.src.skip(4)?;
        self.src.skip(2)?;
        self.src.skip(4)?;
        self.src.skip(2)?;
        let sub_id = self.src.read_u32()?;

        let revision = VideoSubId::from_u32(sub_id);
        if let VideoSubId::Unknown(other) = revision {
            warn!("Stream {}: unknown video sub-id {:#010x}, keeping {}", id, other, nominal_fourcc);
        }
        let fourcc = revision.effective_fourcc(nominal_fourcc);

        info!(
            "Video stream {}: {} {}x{} @ {} fps (sub-id {:#010x})",
            id, fourcc, width, height, fps, sub_id
        );

        Ok(Some(VideoStream {
            fourcc,
            nominal_fourcc,
            sub_id,
            width,
            height,
            fps,
            frame_duration: (fps > 0).then(|| 1.0 / f64::from(fps)),
            bitmap_info: BitmapInfoHeader::new(fourcc, width, height),
        }))
    }
}
