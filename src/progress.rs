//! Progress reporting for a walk.

/// Receives a count update after each terminal item. Purely observational.
pub trait ProgressReporter {
    /// `processed` items are done out of `discovered` seen so far.
    fn advance(&mut self, processed: usize, discovered: usize, name: &str);
}

/// Logs one line per item.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn advance(&mut self, processed: usize, discovered: usize, name: &str) {
        tracing::info!("[{}/{}] {}", processed, discovered, name);
    }
}

/// Discards updates.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn advance(&mut self, _processed: usize, _discovered: usize, _name: &str) {}
}

/// Keeps every update, for inspection after a run.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub updates: Vec<(usize, usize)>,
}

impl ProgressReporter for RecordingProgress {
    fn advance(&mut self, processed: usize, discovered: usize, _name: &str) {
        self.updates.push((processed, discovered));
    }
}
