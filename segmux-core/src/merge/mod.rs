//! Merge orchestration: the sequence of engine invocations that turns
//! ordered segment lists into one muxed MP4 buffer.
//!
//! The orchestrator writes every segment into the engine's scratch
//! namespace, issues at most one concat invocation per track kind, then a
//! final mux with a fast stream-copy path and a one-shot re-encode
//! fallback, and guarantees a best-effort delete for every artifact it
//! created, on success and failure alike.

use crate::engine::MediaEngine;
use crate::error::{CoreError, CoreResult};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

mod manifest;
mod progress;

pub use manifest::build_concat_manifest;
use progress::StageProgress;

/// Classification of a segment as carrying video or audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    /// Container extension for this track's intermediate concatenation.
    fn concat_extension(self) -> &'static str {
        match self {
            TrackKind::Video => "mp4",
            TrackKind::Audio => "m4a",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

/// One ordered, immutable source fragment. The track kind is implied by
/// which list the segment is passed in.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Original file name, used (sanitized) in the scratch artifact name.
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }
}

/// Options for merge behavior.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Audio codec used by the compatibility fallback when a plain stream
    /// copy of both tracks fails.
    pub fallback_audio_codec: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            fallback_audio_codec: "aac".to_string(),
        }
    }
}

/// Merge orchestrator. Owns no engine; one is injected per call.
pub struct Merger {
    pub options: MergeOptions,
}

// Run-unique artifact naming. A process-wide monotonic counter keeps names
// from colliding across rapid repeated or overlapping calls without relying
// on clock resolution.
static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_run_id() -> u64 {
    RUN_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Collects every artifact name created during one merge run so all of them
/// get a delete attempt on every exit path.
#[derive(Default)]
struct ScratchSet {
    names: Vec<String>,
}

impl ScratchSet {
    fn track(&mut self, name: String) {
        self.names.push(name);
    }

    /// Best-effort release of every tracked artifact. Failures are logged
    /// by the engine and never surfaced; the result is already in memory
    /// (or the merge already failed) by the time this runs.
    fn release<E: MediaEngine>(&mut self, engine: &mut E) {
        for name in self.names.drain(..) {
            engine.delete_buffer(&name);
        }
    }
}

impl Merger {
    /// Creates a new merger with default options.
    pub fn new() -> Self {
        Self {
            options: MergeOptions::default(),
        }
    }

    pub fn with_options(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Merges ordered video and audio segment lists into one MP4 buffer.
    ///
    /// Either list may be empty, but not both. `on_progress` receives
    /// monotonically non-decreasing percentages in 0..=100; 100 is emitted
    /// only once the output buffer has been read back. The callback is
    /// invoked synchronously and must not panic, or the invocation in
    /// flight is aborted.
    ///
    /// Not reentrant-safe: artifact names are unique per call (monotonic
    /// run counter), but the engine processes one invocation at a time and
    /// callers must not overlap merges on the same engine.
    pub fn merge<E: MediaEngine>(
        &self,
        engine: &mut E,
        video: &[Segment],
        audio: &[Segment],
        on_progress: &mut dyn FnMut(u8),
    ) -> CoreResult<Vec<u8>> {
        if !engine.is_ready() {
            return Err(CoreError::EngineUnavailable(
                "engine not initialized".to_string(),
            ));
        }
        if video.is_empty() && audio.is_empty() {
            return Err(CoreError::NoInput);
        }

        let run = next_run_id();
        let mut scratch = ScratchSet::default();
        let outcome = self.run_merge(engine, video, audio, run, &mut scratch, on_progress);
        scratch.release(engine);

        match outcome {
            Ok(bytes) => {
                on_progress(100);
                Ok(bytes)
            }
            Err(e) => Err(CoreError::MergeFailed(Box::new(e))),
        }
    }

    fn run_merge<E: MediaEngine>(
        &self,
        engine: &mut E,
        video: &[Segment],
        audio: &[Segment],
        run: u64,
        scratch: &mut ScratchSet,
        on_progress: &mut dyn FnMut(u8),
    ) -> CoreResult<Vec<u8>> {
        on_progress(0);

        let video_names = write_track(engine, video, TrackKind::Video, run, scratch)?;
        let audio_names = write_track(engine, audio, TrackKind::Audio, run, scratch)?;

        // One stage per multi-segment track plus the final mux, fixed
        // before any invocation runs.
        let stage_count =
            usize::from(video_names.len() > 1) + usize::from(audio_names.len() > 1) + 1;
        let mut stages = StageProgress::new(stage_count);
        log::info!(
            "merging {} video and {} audio segment(s) in {stage_count} stage(s)",
            video_names.len(),
            audio_names.len()
        );

        let video_input =
            reduce_track(engine, &video_names, TrackKind::Video, run, scratch, &mut stages, on_progress)?;
        let audio_input =
            reduce_track(engine, &audio_names, TrackKind::Audio, run, scratch, &mut stages, on_progress)?;

        let output_name = format!("run{run}_output.mp4");
        scratch.track(output_name.clone());

        let mut base: Vec<String> = Vec::new();
        if let Some(name) = &video_input {
            base.push("-i".to_string());
            base.push(name.clone());
        }
        if let Some(name) = &audio_input {
            base.push("-i".to_string());
            base.push(name.clone());
        }

        // Fast path: copy both streams without re-encoding. Lowest latency
        // and lossless, but fails on container/codec parameters unsuitable
        // for direct copy.
        let mut fast = base.clone();
        fast.extend(["-c".to_string(), "copy".to_string(), output_name.clone()]);

        match run_stage(engine, &fast, &mut stages, on_progress) {
            Ok(()) => {}
            Err(err @ CoreError::InvocationFailed { .. }) => {
                log::warn!("stream copy mux failed, retrying with audio re-encode: {err}");
                // Drop whatever partial output the failed attempt left
                // behind before re-running into the same name.
                engine.delete_buffer(&output_name);

                let mut safe = base.clone();
                if video_input.is_some() && audio_input.is_some() {
                    safe.extend([
                        "-c:v".to_string(),
                        "copy".to_string(),
                        "-c:a".to_string(),
                        self.options.fallback_audio_codec.clone(),
                        "-strict".to_string(),
                        "experimental".to_string(),
                    ]);
                } else {
                    safe.extend(["-c".to_string(), "copy".to_string()]);
                }
                safe.push(output_name.clone());
                // The fallback gets exactly one shot; its failure fails the
                // merge.
                run_stage(engine, &safe, &mut stages, on_progress)?;
            }
            Err(e) => return Err(e),
        }

        engine.read_buffer(&output_name)
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduces one track to at most one input artifact: zero segments stay
/// absent, a single segment is used directly, and multiple segments are
/// concatenated with the concat demuxer (stream copy), consuming one stage.
///
/// Concat failures are deliberately not retried with a re-encode the way
/// the final mux is; they propagate immediately.
#[allow(clippy::too_many_arguments)]
fn reduce_track<E: MediaEngine>(
    engine: &mut E,
    names: &[String],
    kind: TrackKind,
    run: u64,
    scratch: &mut ScratchSet,
    stages: &mut StageProgress,
    on_progress: &mut dyn FnMut(u8),
) -> CoreResult<Option<String>> {
    match names {
        [] => Ok(None),
        [single] => Ok(Some(single.clone())),
        many => {
            let list_name = format!("run{run}_{kind}_list.txt");
            scratch.track(list_name.clone());
            engine.write_buffer(&list_name, build_concat_manifest(many).as_bytes())?;

            let concat_name = format!("run{run}_{kind}_concat.{}", kind.concat_extension());
            scratch.track(concat_name.clone());

            let args = vec![
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
                "-i".to_string(),
                list_name,
                "-c".to_string(),
                "copy".to_string(),
                concat_name.clone(),
            ];
            run_stage(engine, &args, stages, on_progress)?;
            Ok(Some(concat_name))
        }
    }
}

/// Writes every segment of one track into scratch space under a run-unique
/// name, preserving order. Returns the artifact names in segment order.
fn write_track<E: MediaEngine>(
    engine: &mut E,
    segments: &[Segment],
    kind: TrackKind,
    run: u64,
    scratch: &mut ScratchSet,
) -> CoreResult<Vec<String>> {
    let mut names = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let name = format!("run{run}_{kind}_{index}_{}", sanitize_name(&segment.file_name));
        scratch.track(name.clone());
        engine.write_buffer(&name, &segment.data)?;
        names.push(name);
    }
    Ok(names)
}

/// Runs one invocation as a progress stage: ratios map onto the stage's
/// slice of the percent range, and the stage is marked complete only after
/// a successful invocation (a failed fast mux leaves the stage open for the
/// fallback attempt).
fn run_stage<E: MediaEngine>(
    engine: &mut E,
    args: &[String],
    stages: &mut StageProgress,
    on_progress: &mut dyn FnMut(u8),
) -> CoreResult<()> {
    let mut forward = |ratio: f64| {
        if let Some(percent) = stages.observe(ratio) {
            on_progress(percent);
        }
    };
    engine.run(args, &mut forward)?;
    stages.complete_stage();
    Ok(())
}

/// Keeps artifact names flat and shell-safe: path separators and other
/// unusual characters in caller-supplied file names must not escape the
/// engine's namespace or confuse the concat manifest.
fn sanitize_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "input.m4s".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_and_increasing() {
        let a = next_run_id();
        let b = next_run_id();
        assert!(b > a);
    }

    #[test]
    fn sanitize_replaces_separators_and_quotes() {
        assert_eq!(sanitize_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_name("it's v0.m4s"), "it_s_v0.m4s");
        assert_eq!(sanitize_name(""), "input.m4s");
    }

    #[test]
    fn track_kind_extensions() {
        assert_eq!(TrackKind::Video.concat_extension(), "mp4");
        assert_eq!(TrackKind::Audio.concat_extension(), "m4a");
        assert_eq!(TrackKind::Video.to_string(), "video");
        assert_eq!(TrackKind::Audio.to_string(), "audio");
    }
}
