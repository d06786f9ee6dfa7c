use std::panic::{self, AssertUnwindSafe};

use crate::run::{BatchReport, BatchRun, CancelToken, Clock, ItemProgress, RunState, RunnerSettings};
use crate::{ItemError, WorkItem};

/// Caller supplied work performed on each item.
///
/// Returning `Ok` leaves the item as the operation left it; the operation
/// is responsible for marking success fields itself.
pub trait ItemOperation<T> {
    fn process(&mut self, item: &mut WorkItem<T>) -> Result<(), ItemError>;
}

impl<T, F> ItemOperation<T> for F
where
    F: FnMut(&mut WorkItem<T>) -> Result<(), ItemError>,
{
    fn process(&mut self, item: &mut WorkItem<T>) -> Result<(), ItemError> {
        self(item)
    }
}

/// Cooperative batch runner. Each [`BatchRunner::step`] processes exactly
/// one item; returning from it is the yield point where cancellation is
/// observed.
pub struct BatchRunner<T, O> {
    items: Vec<WorkItem<T>>,
    operation: O,
    run: BatchRun,
}

impl<T, O> BatchRunner<T, O>
where
    O: ItemOperation<T>,
{
    pub fn new(items: Vec<WorkItem<T>>, operation: O) -> Self {
        let run = BatchRun::new(items.len(), RunnerSettings::default());
        Self {
            items,
            operation,
            run,
        }
    }

    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.run = self.run.with_settings(settings);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.run = self.run.with_cancel_token(cancel);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.run = self.run.with_clock(clock);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.run.cancel_token()
    }

    pub fn state(&self) -> RunState {
        self.run.state()
    }

    pub fn items(&self) -> &[WorkItem<T>] {
        &self.items
    }

    /// Processes the next item. `None` once the run is over.
    pub fn step(&mut self) -> Option<ItemProgress> {
        let index = self.run.next_index()?;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.operation.process(&mut self.items[index])
        }))
        .unwrap_or_else(|payload| Err(ItemError::panicked(payload)));
        Some(self.run.record(&mut self.items[index], result))
    }

    /// Ends the run, whether or not every item was processed.
    pub fn finish(self) -> BatchReport<T> {
        self.run.finish(self.items)
    }

    /// Drives the run to the end, reporting after every item and handing the
    /// final list to `on_finished` exactly once.
    pub fn run<P, F>(mut self, mut on_progress: P, on_finished: F)
    where
        P: FnMut(&ItemProgress),
        F: FnOnce(BatchReport<T>),
    {
        while let Some(progress) = self.step() {
            on_progress(&progress);
        }
        on_finished(self.finish());
    }
}

/// Runs `operation` over `items` with default settings.
pub fn run<T, O, P, F>(items: Vec<WorkItem<T>>, operation: O, on_progress: P, on_finished: F)
where
    O: ItemOperation<T>,
    P: FnMut(&ItemProgress),
    F: FnOnce(BatchReport<T>),
{
    BatchRunner::new(items, operation).run(on_progress, on_finished);
}
