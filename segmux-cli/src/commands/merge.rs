// segmux-cli/src/commands/merge.rs
//
// The 'merge' subcommand: reads the segment files into memory, drives the
// core merge against an ffmpeg engine, and writes the resulting MP4.

use crate::cli::MergeArgs;
use indicatif::{ProgressBar, ProgressStyle};
use segmux_core::{format_bytes, CoreResult, FfmpegEngine, Merger, Segment};
use std::path::PathBuf;

pub fn run_merge(args: MergeArgs) -> CoreResult<()> {
    let video = read_segments(&args.video)?;
    let audio = read_segments(&args.audio)?;

    let mut engine = FfmpegEngine::new();
    // Engine log lines already reach the `log` facade under the
    // "segmux::ffmpeg" target, so the sink has nothing extra to do here.
    engine.initialize(Box::new(|_| {}))?;

    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=> "));

    let merger = Merger::new();
    let output = merger.merge(&mut engine, &video, &audio, &mut |percent| {
        bar.set_position(u64::from(percent));
    })?;
    bar.finish_and_clear();

    std::fs::write(&args.output, &output)?;
    println!(
        "Wrote {} ({})",
        args.output.display(),
        format_bytes(output.len() as u64)
    );
    Ok(())
}

/// Reads segment files fully into memory, preserving the order they were
/// given on the command line.
fn read_segments(paths: &[PathBuf]) -> CoreResult<Vec<Segment>> {
    paths
        .iter()
        .map(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "input.m4s".to_string());
            let data = std::fs::read(path)?;
            log::debug!("read {} ({} bytes)", path.display(), data.len());
            Ok(Segment::new(file_name, data))
        })
        .collect()
}
