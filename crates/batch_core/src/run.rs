use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use batch_logging::{batch_error, batch_info};

use crate::duration::format_duration;
use crate::{ItemError, ItemOutcome, WorkItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl RunState {
    pub fn is_finished(self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled)
    }
}

/// Shared cancellation flag. Clones observe the same request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    requested: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Monotonic time source, as an offset from an arbitrary origin.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Compute and report an estimated time until done.
    pub show_est_time: bool,
    /// Ignore cancellation requests for this run.
    pub disable_cancel: bool,
    /// Leading text of the progress label.
    pub status_prefix: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            show_est_time: true,
            disable_cancel: false,
            status_prefix: "Fetched metadata for".to_string(),
        }
    }
}

/// Progress published after each processed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    /// Position of the item just processed.
    pub index: usize,
    /// Items processed so far, including this one.
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
    pub eta_text: Option<String>,
    pub outcome: ItemOutcome,
    /// The run's [`RunnerSettings::status_prefix`].
    pub status_prefix: String,
}

impl ItemProgress {
    /// `"<prefix> 3 / 10 - 2 minutes estimated until done"`
    pub fn label(&self) -> String {
        let mut label = format!("{} {} / {}", self.status_prefix, self.processed, self.total);
        if let Some(eta) = &self.eta_text {
            label.push_str(&format!(" - {eta} estimated until done"));
        }
        label
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Everything a run hands back once it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<T> {
    /// The full list: processed items followed by the untouched remainder.
    pub items: Vec<WorkItem<T>>,
    pub state: RunState,
    /// One outcome per processed item, in list order.
    pub outcomes: Vec<ItemOutcome>,
    pub elapsed: Duration,
}

impl<T> BatchReport<T> {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ItemOutcome::Skipped { .. }))
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ItemOutcome::Error { .. }))
            .count()
    }
}

/// Ephemeral state of one run: position, start time, cancellation.
///
/// Drivers call [`BatchRun::next_index`] at each yield point and
/// [`BatchRun::record`] once the item's operation has returned. The
/// synchronous [`crate::BatchRunner`] and the async driver in the engine
/// share this state machine.
pub struct BatchRun {
    total: usize,
    next: usize,
    state: RunState,
    started: Duration,
    outcomes: Vec<ItemOutcome>,
    settings: RunnerSettings,
    cancel: CancelToken,
    clock: Box<dyn Clock>,
}

impl BatchRun {
    pub fn new(total: usize, settings: RunnerSettings) -> Self {
        Self {
            total,
            next: 0,
            state: RunState::Idle,
            started: Duration::ZERO,
            outcomes: Vec::with_capacity(total),
            settings,
            cancel: CancelToken::new(),
            clock: Box::new(SystemClock::new()),
        }
    }

    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.next
    }

    /// Yield point. Returns the index of the next item to process, or `None`
    /// once the run has completed or been cancelled.
    pub fn next_index(&mut self) -> Option<usize> {
        match self.state {
            RunState::Completed | RunState::Cancelled => return None,
            RunState::Idle => {
                self.state = RunState::Running;
                self.started = self.clock.now();
                batch_info!("Batch run started: {} item(s)", self.total);
            }
            RunState::Running => {}
        }

        if self.next >= self.total {
            self.state = RunState::Completed;
            batch_info!(
                "Batch run completed: {} item(s) in {}",
                self.total,
                format_duration(self.elapsed())
            );
            return None;
        }
        if self.cancel.is_cancelled() && !self.settings.disable_cancel {
            self.state = RunState::Cancelled;
            batch_info!(
                "Batch run cancelled after {} of {} item(s)",
                self.next,
                self.total
            );
            return None;
        }
        Some(self.next)
    }

    /// Classifies the operation's result, applies it to `item` and advances.
    pub fn record<T>(
        &mut self,
        item: &mut WorkItem<T>,
        result: Result<(), ItemError>,
    ) -> ItemProgress {
        let index = self.next;
        match &result {
            Ok(()) => {}
            Err(ItemError::Skip(signal)) => {
                batch_info!(
                    "Item {} skipped: {} (shown to user: {})",
                    index,
                    signal.message,
                    signal.show_to_user
                );
            }
            Err(ItemError::Failed(err)) => {
                batch_error!("Item {} failed: {:#}", index, err);
            }
        }

        let outcome = ItemOutcome::from(result);
        item.apply(&outcome);
        self.outcomes.push(outcome.clone());
        self.next += 1;

        let elapsed = self.elapsed();
        let eta = self
            .settings
            .show_est_time
            .then(|| estimate_remaining(elapsed, self.next, self.total));
        ItemProgress {
            index,
            processed: self.next,
            total: self.total,
            elapsed,
            eta,
            eta_text: eta.map(format_duration),
            outcome,
            status_prefix: self.settings.status_prefix.clone(),
        }
    }

    /// Ends the run and packages the report. A run abandoned mid-way counts
    /// as cancelled.
    pub fn finish<T>(mut self, items: Vec<WorkItem<T>>) -> BatchReport<T> {
        if !self.state.is_finished() {
            self.state = if self.next >= self.total {
                RunState::Completed
            } else {
                RunState::Cancelled
            };
        }
        BatchReport {
            elapsed: self.elapsed(),
            items,
            state: self.state,
            outcomes: self.outcomes,
        }
    }

    fn elapsed(&self) -> Duration {
        if self.state == RunState::Idle {
            return Duration::ZERO;
        }
        self.clock.now().saturating_sub(self.started)
    }
}

/// Remaining time assuming every item costs the average so far.
pub fn estimate_remaining(elapsed: Duration, processed: usize, total: usize) -> Duration {
    if processed == 0 {
        return Duration::ZERO;
    }
    let spent = elapsed.as_secs_f64();
    let remaining = (spent / processed as f64) * total as f64 - spent;
    Duration::try_from_secs_f64(remaining.max(0.0)).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_uses_average_cost_per_item() {
        let eta = estimate_remaining(Duration::from_secs(10), 1, 4);
        assert_eq!(eta, Duration::from_secs(30));
        assert_eq!(estimate_remaining(Duration::from_secs(40), 4, 4), Duration::ZERO);
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 4), Duration::ZERO);
    }

    #[test]
    fn empty_run_completes_on_first_yield() {
        let mut run = BatchRun::new(0, RunnerSettings::default());
        assert_eq!(run.state(), RunState::Idle);
        assert_eq!(run.next_index(), None);
        assert_eq!(run.state(), RunState::Completed);
        assert_eq!(run.next_index(), None);
    }

    #[test]
    fn label_includes_eta_only_when_present() {
        let mut progress = ItemProgress {
            index: 2,
            processed: 3,
            total: 10,
            elapsed: Duration::from_secs(30),
            eta: None,
            eta_text: None,
            outcome: ItemOutcome::Success,
            status_prefix: "Fetched metadata for".to_string(),
        };
        assert_eq!(progress.label(), "Fetched metadata for 3 / 10");

        progress.eta_text = Some("1 minute, 10 seconds".to_string());
        assert_eq!(
            progress.label(),
            "Fetched metadata for 3 / 10 - 1 minute, 10 seconds estimated until done"
        );
    }
}
