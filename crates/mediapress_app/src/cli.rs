use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "mediapress",
    version,
    about = "Batch-convert images and videos to web-friendly formats"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert PNG/JPEG images to WebP.
    Images {
        /// Input files to convert.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        options: ConvertArgs,
    },
    /// Convert MP4 videos to WebM.
    Videos {
        /// Input files to convert.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        options: ConvertArgs,
    },
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Directory the converted output is written to.
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// How many conversions may run at once. 1 keeps strict upload order.
    #[arg(long, default_value_t = 2)]
    pub workers: usize,

    /// Interpolate smooth progress ticks instead of reporting only what the
    /// encoder observes.
    #[arg(long)]
    pub smooth_progress: bool,

    /// Override the ffmpeg binary used for video conversion.
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Override the ffprobe binary used for video probing.
    #[arg(long)]
    pub ffprobe: Option<PathBuf>,

    /// Skip the JSON manifest written beside the output.
    #[arg(long)]
    pub no_manifest: bool,

    /// Where log output goes.
    #[arg(long, value_enum, default_value = "file")]
    pub log: LogTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}
