//! Batch engine: drivers for the batch runner and the I/O around it.
mod async_runner;
mod fetch;
mod handle;
mod store;
mod types;

pub use async_runner::{run_async, AsyncItemOperation};
pub use fetch::{
    FetchSettings, FetchedPage, MetadataFetcher, StoryRequest, REJECTED_ICON, STATUS_FETCHED,
};
pub use handle::BatchHandle;
pub use store::{export_json, import_json, RejectListStore, RejectRecordData, StoreError};
pub use types::{BatchEvent, FailureKind, FetchError, NullProgressSink, ProgressSink};
