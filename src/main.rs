mod cli;

use rmdemux::config;
use rmdemux_media::{
    DemuxOptions, Error as DemuxError, IndexMode, IndexSource, RmDemuxer, SeekMode, SeekTarget,
    StreamDescriptor, StreamKind,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "rmdemux=trace,rmdemux_media=trace,rmdemux_probe=debug".to_string()
        } else {
            "rmdemux=info,rmdemux_media=info,rmdemux_probe=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe { file, json } => probe_file(&file, json),
        Commands::Index {
            file,
            mode,
            json,
            entries,
        } => index_file(&file, cli.config.as_deref(), mode, json, entries),
        Commands::Demux {
            file,
            output_dir,
            seek,
            max_packets,
            index_mode,
            dump_index,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let mut options = DemuxOptions::from(&config.demux);
            if let Some(mode) = index_mode {
                options.index_mode = mode;
            }
            options.dump_index |= dump_index;
            let output_dir = output_dir.unwrap_or(config.output.directory);
            demux_file(&file, &output_dir, options, seek, max_packets)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("rmdemux {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn probe_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let media_info = rmdemux_probe::probe_file(file)
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", media_info.file_path);
    println!("Container: {}", media_info.container);
    println!("Size: {} bytes", media_info.file_size);
    if let Some(ms) = media_info.duration_ms {
        let secs = ms / 1000;
        let mins = secs / 60;
        let hours = mins / 60;
        println!(
            "Duration: {:02}:{:02}:{:02}.{:03}",
            hours,
            mins % 60,
            secs % 60,
            ms % 1000
        );
    }
    if let Some(bitrate) = media_info.bitrate {
        println!("Bitrate: {} bps", bitrate);
    }
    match media_info.packet_count {
        Some(count) => println!("Packets: {}", count),
        None => println!("Packets: unknown"),
    }
    match media_info.index_offset {
        Some(offset) => println!("Index: at {:#x}", offset),
        None => println!("Index: none"),
    }

    if !media_info.metadata.is_empty() {
        println!("\nMetadata:");
        for (key, value) in &media_info.metadata {
            println!("  {}: {}", key, value);
        }
    }

    println!("\nVideo Tracks: {}", media_info.video_tracks.len());
    for track in &media_info.video_tracks {
        println!("  {}", track);
    }

    println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
    for track in &media_info.audio_tracks {
        println!("  {}", track);
    }

    if !media_info.skipped.is_empty() {
        println!("\nSkipped Streams: {}", media_info.skipped.len());
        for skipped in &media_info.skipped {
            println!("  #{} {}", skipped.stream_id, skipped.reason);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct IndexReport {
    file: String,
    source: &'static str,
    streams: Vec<StreamIndexReport>,
}

#[derive(Serialize)]
struct StreamIndexReport {
    stream_id: u16,
    entries: usize,
    keyframes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    list: Vec<EntryReport>,
}

#[derive(Serialize)]
struct EntryReport {
    timestamp: u32,
    time_secs: f64,
    offset: u64,
    packet_no: u32,
    keyframe: bool,
}

fn index_file(
    file: &Path,
    config_path: Option<&Path>,
    mode: IndexMode,
    json: bool,
    entries: bool,
) -> Result<()> {
    if mode == IndexMode::Off {
        anyhow::bail!("--mode must be 'embedded' or 'generate'");
    }

    let config = config::load_config_or_default(config_path)?;
    let options = DemuxOptions {
        index_mode: mode,
        ..DemuxOptions::from(&config.demux)
    };

    let demuxer = RmDemuxer::open_path(file, options)
        .with_context(|| format!("Failed to open {:?}", file))?;
    let index = demuxer
        .index()
        .with_context(|| format!("No {} index could be built for {:?}", mode, file))?;

    let report = IndexReport {
        file: file.display().to_string(),
        source: match index.source() {
            IndexSource::Embedded => "embedded",
            IndexSource::Generated => "generated",
        },
        streams: index
            .iter()
            .map(|(stream_id, stream)| StreamIndexReport {
                stream_id,
                entries: stream.len(),
                keyframes: stream.keyframe_count(),
                list: if entries {
                    stream
                        .entries()
                        .iter()
                        .map(|e| EntryReport {
                            timestamp: e.timestamp,
                            time_secs: e.time_secs(),
                            offset: e.offset,
                            packet_no: e.packet_no,
                            keyframe: e.is_keyframe(),
                        })
                        .collect()
                } else {
                    Vec::new()
                },
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", report.file);
    println!("Index: {}", report.source);
    for stream in &report.streams {
        println!(
            "  Stream {}: {} entries, {} keyframes",
            stream.stream_id, stream.entries, stream.keyframes
        );
        for entry in &stream.list {
            println!(
                "    #{:<6} {:>10.3}s  offset {:#010x}{}",
                entry.packet_no,
                entry.time_secs,
                entry.offset,
                if entry.keyframe { "  [key]" } else { "" }
            );
        }
    }

    Ok(())
}

#[derive(Default)]
struct StreamTotals {
    packets: u64,
    bytes: u64,
}

fn demux_file(
    file: &Path,
    output_dir: &Path,
    options: DemuxOptions,
    seek: Option<f64>,
    max_packets: Option<usize>,
) -> Result<()> {
    let mut demuxer = RmDemuxer::open_path(file, options)
        .with_context(|| format!("Failed to open {:?}", file))?;

    if let Some(secs) = seek {
        let outcome = demuxer
            .seek(SeekTarget::Seconds(secs), SeekMode::Absolute)
            .with_context(|| format!("Failed to seek to {}s", secs))?;
        tracing::info!(
            "Seeked to {:.3}s ({} stream {})",
            outcome.time_secs(),
            outcome.kind,
            outcome.stream_id
        );
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut paths: BTreeMap<u16, PathBuf> = BTreeMap::new();
    let mut writers: BTreeMap<u16, BufWriter<File>> = BTreeMap::new();
    for stream in demuxer.registry().iter() {
        let path = output_dir.join(format!("stream_{}.{}", stream.id, stream_extension(stream)));
        let out = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        writers.insert(stream.id, BufWriter::new(out));
        paths.insert(stream.id, path);
    }

    let mut totals: BTreeMap<u16, StreamTotals> = BTreeMap::new();
    let mut pulled = 0usize;
    while max_packets.map_or(true, |max| pulled < max) {
        let packet = match demuxer.next_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break,
            Err(DemuxError::ResyncLimit(n)) => {
                tracing::warn!("Gave up resyncing after {} bad packets, continuing", n);
                continue;
            }
            Err(e) => return Err(anyhow::Error::from(e).context("Failed to read packet")),
        };
        pulled += 1;

        if let Some(writer) = writers.get_mut(&packet.stream_id) {
            writer.write_all(&packet.data)?;
        }
        let entry = totals.entry(packet.stream_id).or_default();
        entry.packets += 1;
        entry.bytes += packet.len() as u64;
    }

    for writer in writers.values_mut() {
        writer.flush()?;
    }

    println!("File: {}", file.display());
    println!("Packets: {}", pulled);
    for stream in demuxer.registry().iter() {
        let t = totals.get(&stream.id);
        println!(
            "  Stream {} ({} {}): {} packets, {} bytes -> {}",
            stream.id,
            stream.kind(),
            stream.codec_tag(),
            t.map_or(0, |t| t.packets),
            t.map_or(0, |t| t.bytes),
            paths.get(&stream.id).map_or_else(String::new, |p| p.display().to_string())
        );
    }

    Ok(())
}

/// File extension for a stream's raw payloads.
fn stream_extension(stream: &StreamDescriptor) -> String {
    match stream.kind() {
        StreamKind::Audio if stream.as_audio().is_some_and(|a| a.needs_byte_swap()) => {
            "ac3".to_string()
        }
        _ => stream.codec_tag().to_string().to_ascii_lowercase(),
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    println!("  Index mode: {}", config.demux.index_mode);
    println!("  Dump index: {}", config.demux.dump_index);
    println!("  Max resync attempts: {}", config.demux.max_resync_attempts);
    println!("  Max streams: {}", config.demux.max_streams);
    println!("  Output directory: {}", config.output.directory.display());
}
