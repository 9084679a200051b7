//! Stage-based progress accounting.
//!
//! The engine reports a completion ratio per invocation; the merge as a
//! whole runs a fixed number of stages known up front. Each stage owns an
//! equal slice of the 0..=99 range; 100 is reserved for "result available"
//! and emitted by the orchestrator once the output buffer has been read.

/// Tracks fractional progress across a fixed number of stages.
///
/// Emitted percentages are strictly increasing: a fallback re-run of a
/// stage restarts the engine's ratio at zero, and suppressing the repeat
/// keeps the caller-visible signal monotonic.
pub(crate) struct StageProgress {
    stage_count: usize,
    completed: usize,
    last_emitted: u8,
}

impl StageProgress {
    pub(crate) fn new(stage_count: usize) -> Self {
        Self {
            stage_count: stage_count.max(1),
            completed: 0,
            last_emitted: 0,
        }
    }

    /// Folds one engine ratio into the overall percentage. Returns the
    /// value to emit, or `None` if it would not advance the signal.
    pub(crate) fn observe(&mut self, ratio: f64) -> Option<u8> {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let raw = (self.completed as f64 + ratio) / self.stage_count as f64 * 100.0;
        let percent = raw.round().min(99.0) as u8;
        if percent > self.last_emitted {
            self.last_emitted = percent;
            Some(percent)
        } else {
            None
        }
    }

    /// Marks the current stage finished; later ratios count toward the next
    /// stage's slice.
    pub(crate) fn complete_stage(&mut self) {
        self.completed = (self.completed + 1).min(self.stage_count);
    }
}
