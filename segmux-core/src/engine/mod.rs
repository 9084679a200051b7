//! Engine boundary: the trait the orchestrator drives, plus the concrete
//! ffmpeg implementation.
//!
//! The orchestrator never talks to ffmpeg directly. It issues four primitive
//! verbs against a [`MediaEngine`]: write a named buffer into the engine's
//! private scratch namespace, run one argument-list invocation, read a named
//! buffer back, delete a named buffer. Keeping the seam this narrow makes the
//! merge logic testable against a recording mock without any ffmpeg binary.

use crate::error::CoreResult;

mod ffmpeg;

pub use ffmpeg::{EngineState, FfmpegEngine};

/// Callback receiving raw engine log lines.
pub type LogSink = Box<dyn FnMut(&str) + Send>;

/// One media-processing engine instance with a private named-buffer namespace.
pub trait MediaEngine {
    /// Whether initialization has completed successfully. Pure query.
    fn is_ready(&self) -> bool;

    /// Stores `bytes` under `name` in the engine's private namespace,
    /// silently overwriting any existing buffer of that name.
    fn write_buffer(&mut self, name: &str, bytes: &[u8]) -> CoreResult<()>;

    /// Executes one invocation with the given argument list. A fresh
    /// progress callback is registered for each invocation; the engine only
    /// reports completion ratios (0.0..=1.0) for the most recently started
    /// one. Invocation failure surfaces as
    /// [`CoreError::InvocationFailed`](crate::CoreError::InvocationFailed)
    /// without poisoning the engine for later invocations.
    fn run(&mut self, args: &[String], on_progress: &mut dyn FnMut(f64)) -> CoreResult<()>;

    /// Returns the bytes stored under `name`, or
    /// [`CoreError::ArtifactNotFound`](crate::CoreError::ArtifactNotFound)
    /// if no such buffer exists.
    fn read_buffer(&mut self, name: &str) -> CoreResult<Vec<u8>>;

    /// Best-effort removal of `name`. Never raises; a missing buffer is not
    /// an error and deletion failures are only logged.
    fn delete_buffer(&mut self, name: &str);
}
