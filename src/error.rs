use std::fmt;
use std::sync::Arc;

/// The failure stored by a delivered promise.
///
/// Cancellation is a failure like any other, so every failure observer sees
/// it, but it is also its own variant so that cancellation observers can
/// pick it out.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("the promise delivery was canceled")]
    Canceled,
    #[error(transparent)]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

/// The cancellation marker shared by every promise.
pub static CANCELED: Error = Error::Canceled;

impl Error {
    /// Wraps an arbitrary error as a promise failure.
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Failed(Arc::new(err))
    }

    /// A failure that only carries a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Error::new(Message(message.to_string()))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}

/// Failures compare by identity: two `Failed` values are equal only when
/// they share the same underlying error.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Canceled, Error::Canceled) => true,
            (Error::Failed(a), Error::Failed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::msg(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::new(Message(message))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(err)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);
