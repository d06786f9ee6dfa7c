use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use batch_core::{BatchReport, BatchRun, ItemError, WorkItem};
use futures_util::FutureExt;

use crate::ProgressSink;

/// Per-item operation that awaits I/O.
#[async_trait]
pub trait AsyncItemOperation<T: Send>: Send + Sync {
    async fn process(&self, item: &mut WorkItem<T>) -> Result<(), ItemError>;
}

/// Drives `run` over `items`, one item at a time. `run` must have been
/// created for `items.len()` items.
///
/// The task yields to the scheduler between items; that is where a
/// cancellation request on the run's token takes effect. Failures and panics
/// of the operation never escape.
pub async fn run_async<T: Send>(
    mut items: Vec<WorkItem<T>>,
    operation: &dyn AsyncItemOperation<T>,
    mut run: BatchRun,
    sink: &dyn ProgressSink,
) -> BatchReport<T> {
    debug_assert_eq!(run.total(), items.len());
    while let Some(index) = run.next_index() {
        let Some(item) = items.get_mut(index) else {
            break;
        };
        let result = AssertUnwindSafe(operation.process(item))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ItemError::panicked(payload)));
        let progress = run.record(item, result);
        sink.emit(&progress);
        tokio::task::yield_now().await;
    }
    run.finish(items)
}
