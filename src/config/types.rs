use rmdemux_media::{DemuxOptions, IndexMode, DEFAULT_MAX_RESYNC};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub demux: DemuxConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemuxConfig {
    /// How an index is obtained when a file is opened
    #[serde(default)]
    pub index_mode: IndexMode,

    /// Log every index entry after a build
    #[serde(default)]
    pub dump_index: bool,

    /// Malformed packets skipped in one pull before giving up (default: 64)
    #[serde(default = "default_max_resync_attempts")]
    pub max_resync_attempts: u32,

    /// Audio and video stream slots, per kind (default: 32)
    #[serde(default = "default_max_streams")]
    pub max_streams: usize,
}

fn default_max_resync_attempts() -> u32 {
    DEFAULT_MAX_RESYNC
}

fn default_max_streams() -> usize {
    rmdemux_media::rmf::DEFAULT_MAX_STREAMS
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            index_mode: IndexMode::default(),
            dump_index: false,
            max_resync_attempts: default_max_resync_attempts(),
            max_streams: default_max_streams(),
        }
    }
}

impl From<&DemuxConfig> for DemuxOptions {
    fn from(config: &DemuxConfig) -> Self {
        DemuxOptions {
            index_mode: config.index_mode,
            dump_index: config.dump_index,
            max_resync_attempts: config.max_resync_attempts,
            max_streams: config.max_streams,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Where `demux` writes per-stream payload files
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./demuxed")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}
