//! Index-based seeking.
//!
//! Seeking works on packet counters rather than timestamps: the target is
//! converted to a number of video frames and added to both the audio and the
//! video packet counter. Whichever counter is behind is then moved forward
//! to the next keyframe entry of its stream, and the source is repositioned
//! at that entry. This is a best-effort heuristic; the landing point is the
//! keyframe of the stream that was behind.

use crate::demux::{DataCursor, RmDemuxer};
use crate::index::IndexEntry;
use crate::rmf::StreamKind;
use crate::source::ByteSource;
use crate::{Error, Result};
use tracing::{debug, warn};

/// Where to seek to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// Offset in seconds, converted to frames with the video frame rate.
    Seconds(f64),
    /// Offset in video frames.
    Frames(i64),
}

/// How the target is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Relative to the current packet counters.
    Relative,
    /// From the start of the file.
    Absolute,
}

/// Where a seek landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekOutcome {
    /// Stream whose keyframe was chosen.
    pub stream_id: u16,
    pub kind: StreamKind,
    /// The entry the source now points at.
    pub entry: IndexEntry,
    /// Audio packet counter after the seek.
    pub audio_packet: usize,
    /// Video packet counter after the seek.
    pub video_packet: usize,
}

impl SeekOutcome {
    /// Landing time in seconds.
    pub fn time_secs(&self) -> f64 {
        self.entry.time_secs()
    }
}

impl<S: ByteSource> RmDemuxer<S> {
    /// Reposition the demuxer.
    ///
    /// Requires a built index plus at least one registered audio and one
    /// registered video stream. On any error the source position and the
    /// session counters are left unchanged.
    ///
    /// The `DATA` chunk holding the landing entry is located so that pulling
    /// continues with that chunk's remaining packet count and its chain.
    pub fn seek(&mut self, target: SeekTarget, mode: SeekMode) -> Result<SeekOutcome> {
        let index = self.index.as_ref().ok_or(Error::NotSeekable("no index"))?;
        let audio = self
            .registry
            .primary_audio()
            .ok_or(Error::NotSeekable("no audio stream"))?;
        let video = self
            .registry
            .primary_video()
            .ok_or(Error::NotSeekable("no video stream"))?;
        let fps = video.as_video().map_or(0, |v| v.fps);
        let (audio_id, video_id) = (audio.id, video.id);

        let audio_index = index
            .stream(audio_id)
            .ok_or(Error::NotSeekable("audio stream is not indexed"))?;
        let video_index = index
            .stream(video_id)
            .ok_or(Error::NotSeekable("video stream is not indexed"))?;

        let frames = match target {
            SeekTarget::Seconds(secs) => (secs * f64::from(fps)) as i64,
            SeekTarget::Frames(frames) => frames,
        };
        let (audio_base, video_base) = match mode {
            SeekMode::Absolute => (0, 0),
            SeekMode::Relative => (self.audio_packets, self.video_packets),
        };

        let advance = |base: usize| -> usize {
            let moved = (base as i64).saturating_add(frames).max(0);
            usize::try_from(moved).unwrap_or(usize::MAX)
        };
        let mut audio_packet = advance(audio_base);
        let mut video_packet = advance(video_base);

        if audio_packet >= audio_index.len() {
            return Err(Error::seek_out_of_range(format!(
                "audio packet {} of {}",
                audio_packet,
                audio_index.len()
            )));
        }
        if video_packet >= video_index.len() {
            return Err(Error::seek_out_of_range(format!(
                "video packet {} of {}",
                video_packet,
                video_index.len()
            )));
        }

        let (stream_id, kind, entry) = if audio_packet > video_packet {
            video_packet = video_index
                .next_keyframe_from(video_packet)
                .ok_or_else(|| Error::seek_out_of_range("no video keyframe after target"))?;
            (video_id, StreamKind::Video, video_index.entries()[video_packet])
        } else {
            audio_packet = audio_index
                .next_keyframe_from(audio_packet)
                .ok_or_else(|| Error::seek_out_of_range("no audio keyframe after target"))?;
            (audio_id, StreamKind::Audio, audio_index.entries()[audio_packet])
        };

        debug!(
            "Seek {:?} {:?}: {} frames -> {} stream {} entry at {:#x} (ts {})",
            mode, target, frames, kind, stream_id, entry.offset, entry.timestamp
        );

        let origin = self.source.tell();
        let located = match self.locate_data_chunk(&entry) {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                warn!("Index entry at {:#x} lies outside every DATA chunk", entry.offset);
                None
            }
            Err(e) => {
                warn!("Cannot walk DATA chunks for seek: {}", e);
                None
            }
        };
        if let Err(e) = self.source.seek(entry.offset) {
            self.source.seek(origin)?;
            return Err(e);
        }

        self.chunks_seen.clear();
        self.chunk = match located {
            Some((chunk_offset, cursor)) => {
                self.chunks_seen.insert(chunk_offset);
                cursor
            }
            None => DataCursor::UNBOUNDED,
        };
        self.audio_packets = audio_packet;
        self.video_packets = video_packet;
        self.packets_read = entry.packet_no;

        Ok(SeekOutcome {
            stream_id,
            kind,
            entry,
            audio_packet,
            video_packet,
        })
    }
}
