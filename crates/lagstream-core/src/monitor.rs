//! External monitoring hooks polled by the run loop

/// Abort/progress port polled at a fixed record cadence during a run.
pub trait RunMonitor {
    /// Whether the run should stop now. An aborted run produces no result.
    fn should_abort(&self) -> bool;

    /// Report progress; `fraction` is in [0, 1], negative when unknown
    fn set_progress(&mut self, fraction: f64);

    /// Whether the caller wants a copy of the curve produced so far
    fn preview_requested(&self) -> bool;
}

/// Monitor that never aborts; the default for unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl RunMonitor for NullMonitor {
    fn should_abort(&self) -> bool {
        false
    }

    fn set_progress(&mut self, _fraction: f64) {}

    fn preview_requested(&self) -> bool {
        false
    }
}
