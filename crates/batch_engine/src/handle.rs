use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use batch_core::{
    BatchReport, BatchRunner, CancelToken, ItemOperation, RunnerSettings, WorkItem,
};
use batch_logging::batch_warn;

use crate::BatchEvent;

/// A batch running on its own worker thread.
///
/// The worker owns the item list for the whole run and hands it back in the
/// final [`BatchEvent::Finished`].
pub struct BatchHandle<T> {
    cancel: CancelToken,
    event_rx: mpsc::Receiver<BatchEvent<T>>,
}

impl<T> BatchHandle<T>
where
    T: Send + 'static,
{
    pub fn spawn<O>(items: Vec<WorkItem<T>>, operation: O, settings: RunnerSettings) -> Self
    where
        O: ItemOperation<T> + Send + 'static,
    {
        Self::spawn_with_cancel(items, operation, settings, CancelToken::new())
    }

    /// Like [`BatchHandle::spawn`], observing an existing token so the
    /// operation itself may request cancellation.
    pub fn spawn_with_cancel<O>(
        items: Vec<WorkItem<T>>,
        operation: O,
        settings: RunnerSettings,
        cancel: CancelToken,
    ) -> Self
    where
        O: ItemOperation<T> + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel();
        let runner = BatchRunner::new(items, operation)
            .with_settings(settings)
            .with_cancel_token(cancel.clone());

        thread::spawn(move || {
            let progress_tx = event_tx.clone();
            runner.run(
                |progress| {
                    let _ = progress_tx.send(BatchEvent::Progress(progress.clone()));
                },
                |report| {
                    if event_tx.send(BatchEvent::Finished(report)).is_err() {
                        batch_warn!("Batch finished after its handle was dropped");
                    }
                },
            );
        });

        Self { cancel, event_rx }
    }
}

impl<T> BatchHandle<T> {
    /// Requests cancellation; honoured once the current item returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn try_recv(&self) -> Option<BatchEvent<T>> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks for the next event. `None` once the worker is gone.
    pub fn recv(&self) -> Option<BatchEvent<T>> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<BatchEvent<T>> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Drains events until the run finishes and returns its report.
    pub fn wait(self) -> Option<BatchReport<T>> {
        while let Some(event) = self.recv() {
            if let BatchEvent::Finished(report) = event {
                return Some(report);
            }
        }
        None
    }
}
