//! Progress observation for asset downloads.

use std::io::Write;

/// Receives download progress. Purely observational: nothing an observer
/// does can change the outcome of a download.
pub trait ProgressObserver: Send + Sync {
    /// Called before each attempt. Percentages restart from zero afterwards.
    fn on_attempt(&self, _attempt: usize, _max_attempts: usize) {}

    /// Percentage complete, never decreasing within one attempt.
    fn on_progress(&self, percent: u8);
}

/// Discards all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&self, _percent: u8) {}
}

/// Rewrites a single `Downloading: N%` line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_attempt(&self, attempt: usize, max_attempts: usize) {
        if attempt > 1 {
            println!("\nRetrying download (attempt {}/{})...", attempt, max_attempts);
        }
    }

    fn on_progress(&self, percent: u8) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\rDownloading: {}%", percent);
        if percent >= 100 {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}
