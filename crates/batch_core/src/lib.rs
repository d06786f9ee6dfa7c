//! Batch core: the cooperative batch runner and the reject record codec.
//!
//! Nothing in here does I/O. Per-item work and URL canonicalization are
//! supplied by the caller.
mod canonical;
mod codec;
mod duration;
mod item;
mod reason;
mod record;
mod reject_list;
mod run;
mod runner;

pub use canonical::{normalize_url, Canonicalizer, UrlCanonicalizer};
pub use codec::parse_line;
pub use duration::{format_duration, format_seconds, LESS_THAN_ONE_SECOND};
pub use item::{
    ItemError, ItemOutcome, SkipSignal, WorkItem, DEFAULT_SKIP_ICON, STATUS_ERROR, STATUS_SKIPPED,
};
pub use reason::annotate_note;
pub use record::{OriginId, RecordFields, RejectRecord};
pub use reject_list::RejectList;
pub use run::{
    estimate_remaining, BatchReport, BatchRun, CancelToken, Clock, ItemProgress, RunState,
    RunnerSettings, SystemClock,
};
pub use runner::{run, BatchRunner, ItemOperation};
