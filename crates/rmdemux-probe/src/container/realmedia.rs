//! RealMedia container parsing

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use rmdemux_media::{DemuxOptions, IndexMode, IoSource, RmDemuxer, StreamDescriptor};
use tracing::debug;

use crate::error::ProbeError;
use crate::types::{AudioTrack, MediaInfo, SkippedTrack, VideoTrack};

/// Probe a RealMedia file
pub fn probe(path: &Path) -> Result<MediaInfo, ProbeError> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut info = probe_reader(BufReader::new(file))?;
    info.file_path = path.to_string_lossy().to_string();
    info.file_size = file_size;
    Ok(info)
}

/// Probe RealMedia data from any seekable reader
///
/// Only the header section is read. `file_path` is set to `<memory>`.
pub fn probe_reader<R: Read + Seek>(reader: R) -> Result<MediaInfo, ProbeError> {
    let source = IoSource::new(reader)?;
    let file_size = source.len();

    let options = DemuxOptions {
        index_mode: IndexMode::Off,
        ..DemuxOptions::default()
    };
    let demuxer = RmDemuxer::open(source, options)?;
    let header = demuxer.header();

    let mut video_tracks = Vec::new();
    let mut audio_tracks = Vec::new();
    for stream in demuxer.registry().iter() {
        if let Some(track) = video_track(stream) {
            video_tracks.push(track);
        } else if let Some(track) = audio_track(stream) {
            audio_tracks.push(track);
        }
    }

    let properties = header.properties.as_ref();
    let info = MediaInfo {
        file_path: "<memory>".to_string(),
        file_size,
        container: "RealMedia".to_string(),
        duration_ms: properties.map(|p| u64::from(p.duration_ms)),
        bitrate: properties.map(|p| p.avg_bitrate),
        packet_count: header.total_packets.known(),
        index_offset: header.has_embedded_index().then_some(header.index_offset),
        metadata: header
            .content
            .pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        video_tracks,
        audio_tracks,
        skipped: header
            .skipped_streams
            .iter()
            .map(|s| SkippedTrack {
                stream_id: s.id,
                reason: s.reason.to_string(),
            })
            .collect(),
    };

    debug!(
        "Probed RealMedia: {} video, {} audio, {} skipped",
        info.video_tracks.len(),
        info.audio_tracks.len(),
        info.skipped.len()
    );

    Ok(info)
}

fn video_track(stream: &StreamDescriptor) -> Option<VideoTrack> {
    let video = stream.as_video()?;
    Some(VideoTrack {
        stream_id: stream.id,
        codec: video.fourcc.to_string(),
        codec_name: video.codec_name().to_string(),
        width: u32::from(video.width),
        height: u32::from(video.height),
        frame_rate: (video.fps > 0).then(|| f64::from(video.fps)),
        bitrate: stream.avg_bitrate,
    })
}

fn audio_track(stream: &StreamDescriptor) -> Option<AudioTrack> {
    let audio = stream.as_audio()?;
    Some(AudioTrack {
        stream_id: stream.id,
        codec: audio.identity.to_string(),
        codec_name: audio.codec.description().to_string(),
        channels: audio.channels,
        sample_rate: u32::from(audio.sample_rate),
        frame_size: audio.frame_size,
        block_align: audio.wave_format.block_align,
        bitrate: stream.avg_bitrate,
    })
}
