//! Progress bar for migrate and rollback runs

use dw_engine::{Direction, MigrateError, MigrationObserver, MigrationStep};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Draws one bar per batch; created lazily once the lock is held.
#[derive(Default)]
pub(crate) struct ProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl MigrationObserver for ProgressObserver {
    fn on_batch_start(&self, total: usize, _direction: Direction) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_start(&self, step: &MigrationStep<'_>) {
        let verb = match step.direction {
            Direction::Upgrade => "Applying",
            Direction::Rollback => "Reverting",
        };
        self.with_bar(|pb| pb.set_message(format!("{verb}: {}", step.filename)));
    }

    fn on_complete(&self, step: &MigrationStep<'_>, elapsed: Duration) {
        self.with_bar(|pb| {
            pb.println(format!("  ✓ {} [{}ms]", step.filename, elapsed.as_millis()));
            pb.set_position(step.index as u64);
        });
    }

    fn on_failed(&self, step: &MigrationStep<'_>, error: &MigrateError) {
        self.with_bar(|pb| pb.println(format!("  ✗ {} - {}", step.filename, error)));
    }

    fn on_batch_end(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_with_message("Complete");
            }
        }
    }
}
