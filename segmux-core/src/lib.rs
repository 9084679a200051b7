//! Core library for merging segmented media files using ffmpeg.
//!
//! This crate takes ordered lists of `.m4s` video and audio segment buffers,
//! concatenates each track with ffmpeg's concat demuxer, and muxes the
//! results into a single MP4 buffer. ffmpeg is treated as a black box behind
//! the [`MediaEngine`] trait; this library only decides which invocations to
//! issue, how intermediate artifacts are named and cleaned up, and how the
//! individual invocations roll up into one progress signal.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use segmux_core::{FfmpegEngine, Merger, Segment};
//!
//! let mut engine = FfmpegEngine::new();
//! engine.initialize(Box::new(|line| log::debug!("ffmpeg: {line}"))).unwrap();
//!
//! let video = vec![
//!     Segment::new("v0.m4s", std::fs::read("v0.m4s").unwrap()),
//!     Segment::new("v1.m4s", std::fs::read("v1.m4s").unwrap()),
//! ];
//! let audio = vec![Segment::new("a0.m4s", std::fs::read("a0.m4s").unwrap())];
//!
//! let mp4 = Merger::new()
//!     .merge(&mut engine, &video, &audio, &mut |pct| println!("{pct}%"))
//!     .unwrap();
//! std::fs::write("out.mp4", mp4).unwrap();
//! ```

pub mod engine;
pub mod error;
pub mod merge;
pub mod utils;

// Re-exports for public API
pub use engine::{EngineState, FfmpegEngine, LogSink, MediaEngine};
pub use error::{CoreError, CoreResult};
pub use merge::{MergeOptions, Merger, Segment, TrackKind};
pub use utils::{format_bytes, parse_ffmpeg_time};
