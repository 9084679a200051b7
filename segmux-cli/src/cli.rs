// segmux-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Segmux: segmented media merging tool",
    long_about = "Stitches segmented .m4s video/audio chunks into a single MP4 using ffmpeg via the segmux-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show raw engine log lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merges ordered video/audio segment files into one MP4
    Merge(MergeArgs),
}

#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Video segment file, in playback order (repeatable)
    #[arg(short = 'v', long = "video", value_name = "FILE", action = clap::ArgAction::Append)]
    pub video: Vec<PathBuf>,

    /// Audio segment file, in playback order (repeatable)
    #[arg(short = 'a', long = "audio", value_name = "FILE", action = clap::ArgAction::Append)]
    pub audio: Vec<PathBuf>,

    /// Output MP4 path
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "output.mp4")]
    pub output: PathBuf,
}
