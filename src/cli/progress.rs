use billcopy::contexts::{BatchOutcome, GenerationError};
use std::time::Instant;

/// How a batch item ended, as far as the summary is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Succeeded,
    Degraded,
    Failed,
    Cancelled,
}

impl ItemStatus {
    pub fn of(outcome: &BatchOutcome) -> Self {
        match outcome {
            Ok(result) if result.is_degraded() => ItemStatus::Degraded,
            Ok(_) => ItemStatus::Succeeded,
            Err(GenerationError::Cancelled) => ItemStatus::Cancelled,
            Err(_) => ItemStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Succeeded => "ok",
            ItemStatus::Degraded => "degraded",
            ItemStatus::Failed => "failed",
            ItemStatus::Cancelled => "cancelled",
        }
    }
}

/// Batch progress on stderr, so stdout stays free for results
pub struct ProgressIndicator {
    total: usize,
    completed: usize,
    degraded: usize,
    failed: usize,
    cancelled: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            degraded: 0,
            failed: 0,
            cancelled: 0,
            start_time: Instant::now(),
        }
    }

    fn done(&self) -> usize {
        self.completed + self.degraded + self.failed + self.cancelled
    }

    pub fn start_item(&self, name: &str) {
        eprintln!("Processing: {} ({}/{})", name, self.done() + 1, self.total);
    }

    pub fn complete_item(&mut self, name: &str, status: ItemStatus) {
        match status {
            ItemStatus::Succeeded => self.completed += 1,
            ItemStatus::Degraded => {
                self.degraded += 1;
                eprintln!("⚠ {} completed with variants over limit", name);
            }
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        eprintln!("\n{}", "=".repeat(60));
        eprintln!("Summary:");
        eprintln!("  Total:     {}", self.total);
        eprintln!("  Succeeded: {}", self.completed);
        eprintln!("  Degraded:  {}", self.degraded);
        eprintln!("  Failed:    {}", self.failed);
        if self.cancelled > 0 {
            eprintln!("  Cancelled: {}", self.cancelled);
        }
        eprintln!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        eprintln!("{}", "=".repeat(60));
    }
}
