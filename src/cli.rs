use clap::{Parser, Subcommand};
use rmdemux_media::IndexMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rmdemux")]
#[command(author, version, about = "RealMedia (.rm/.rmvb) demuxing tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a RealMedia file and display its header summary
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build an index and print per-stream statistics
    Index {
        /// File to index
        #[arg(required = true)]
        file: PathBuf,

        /// Index strategy (embedded or generate)
        #[arg(long, default_value = "embedded")]
        mode: IndexMode,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// List every index entry
        #[arg(long)]
        entries: bool,
    },

    /// Split a file into per-stream payload files
    Demux {
        /// File to demux
        #[arg(required = true)]
        file: PathBuf,

        /// Directory for the stream files (overrides the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seek forward this many seconds before pulling packets
        #[arg(long)]
        seek: Option<f64>,

        /// Stop after this many packets
        #[arg(long)]
        max_packets: Option<usize>,

        /// Index strategy (overrides the config)
        #[arg(long)]
        index_mode: Option<IndexMode>,

        /// Log every index entry after the build
        #[arg(long)]
        dump_index: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
