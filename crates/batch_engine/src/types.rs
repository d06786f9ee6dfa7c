use std::fmt;

use batch_core::{BatchReport, ItemProgress};

/// Messages published by a running batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent<T> {
    Progress(ItemProgress),
    /// Sent exactly once, last.
    Finished(BatchReport<T>),
}

/// Receives progress from a running batch.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: &ItemProgress);
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _progress: &ItemProgress) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&ItemProgress) + Send + Sync,
{
    fn emit(&self, progress: &ItemProgress) {
        self(progress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => match actual {
                Some(actual) => write!(f, "response too large ({actual} > {max_bytes} bytes)"),
                None => write!(f, "response too large (max {max_bytes} bytes)"),
            },
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
