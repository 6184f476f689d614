use tracing::info;

/// Receives human-readable progress while an atlas is built.
pub trait Progress: Send + Sync {
    fn message(&self, msg: &str);

    /// Called after compositing batch `done` of `total`, with the share of frames drawn so far.
    fn batch_done(&self, done: usize, total: usize, percent: u32) {
        let _ = (done, total);
        self.message(&format!("Processed: {}%", percent));
    }
}

/// Discards everything; used when logging is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn message(&self, _msg: &str) {}
}

/// Forwards progress to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn message(&self, msg: &str) {
        info!("{}", msg);
    }
}

/// Picks the sink matching the `log` option.
pub fn progress_for(log: bool) -> &'static dyn Progress {
    if log {
        &TracingProgress as &'static dyn Progress
    } else {
        &NoProgress
    }
}
