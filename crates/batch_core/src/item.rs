use std::any::Any;
use std::fmt;

/// Status written by the runner when an operation asks to skip its item.
pub const STATUS_SKIPPED: &str = "Skipped";
/// Status written by the runner when an operation fails.
pub const STATUS_ERROR: &str = "Error";
/// Icon used for skips that do not name one.
pub const DEFAULT_SKIP_ICON: &str = "dialog_error.png";

/// One unit of batch work.
///
/// The runner only ever writes `good`, `status`, `comment`, `icon` and
/// `show_error`. Everything the caller cares about lives in `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<T> {
    pub good: bool,
    pub status: Option<String>,
    pub comment: String,
    pub icon: Option<String>,
    pub show_error: bool,
    pub data: T,
}

impl<T> WorkItem<T> {
    pub fn new(data: T) -> Self {
        Self {
            good: false,
            status: None,
            comment: String::new(),
            icon: None,
            show_error: false,
            data,
        }
    }

    /// Marks the item as successfully handled with the given status.
    pub fn mark_good(&mut self, status: impl Into<String>) {
        self.good = true;
        self.status = Some(status.into());
    }

    pub(crate) fn apply(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Success => {}
            ItemOutcome::Skipped {
                message,
                icon,
                show_to_user,
            } => {
                self.status = Some(STATUS_SKIPPED.to_string());
                self.good = false;
                self.show_error = *show_to_user;
                self.comment = message.clone();
                self.icon = Some(icon.clone());
            }
            ItemOutcome::Error { message } => {
                self.good = false;
                self.status = Some(STATUS_ERROR.to_string());
                self.show_error = true;
                self.comment = message.clone();
            }
        }
    }
}

/// Explicit request from an operation to skip its item.
///
/// This is an expected termination, not a failure: the message is meant for
/// the user and `icon` names the image shown next to the item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SkipSignal {
    pub message: String,
    pub icon: String,
    pub show_to_user: bool,
}

impl SkipSignal {
    pub fn new(message: impl Into<String>, icon: impl Into<String>, show_to_user: bool) -> Self {
        Self {
            message: message.into(),
            icon: icon.into(),
            show_to_user,
        }
    }

    /// Skip with the default icon, shown to the user.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self::new(message, DEFAULT_SKIP_ICON, true)
    }
}

/// Error returned by a per-item operation.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Skip(#[from] SkipSignal),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl ItemError {
    pub fn failed(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Failed(anyhow::Error::msg(message))
    }

    /// Converts a caught panic payload into a failure.
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::failed(format!("item operation panicked: {detail}"))
    }
}

/// Classified result of processing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Success,
    Skipped {
        message: String,
        icon: String,
        show_to_user: bool,
    },
    Error {
        message: String,
    },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success)
    }
}

impl From<Result<(), ItemError>> for ItemOutcome {
    fn from(result: Result<(), ItemError>) -> Self {
        match result {
            Ok(()) => ItemOutcome::Success,
            Err(ItemError::Skip(signal)) => ItemOutcome::Skipped {
                message: signal.message,
                icon: signal.icon,
                show_to_user: signal.show_to_user,
            },
            Err(ItemError::Failed(err)) => ItemOutcome::Error {
                message: err.to_string(),
            },
        }
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Success => write!(f, "success"),
            ItemOutcome::Skipped { message, .. } => write!(f, "skipped: {message}"),
            ItemOutcome::Error { message } => write!(f, "error: {message}"),
        }
    }
}
