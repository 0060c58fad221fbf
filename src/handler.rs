//! Handler registry and the one-shot notification dispatcher.
//!
//! Handlers are stored while a promise is pending and moved out of the
//! registry, under the promise lock, by the call that delivers it. Dispatch
//! then runs with no lock held, so a handler may query the promise, register
//! more handlers on it or deliver other promises.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::{Controller, Error, Outcome, Value};

pub(crate) type SuccessHandler = Box<dyn FnOnce(Option<Value>) + Send>;
pub(crate) type FailureHandler = Box<dyn FnOnce(Error) + Send>;
pub(crate) type CanceledHandler = Box<dyn FnOnce() + Send>;
pub(crate) type AlwaysHandler = Box<dyn FnOnce(Controller) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandlerKind {
    Success,
    Failure,
    Canceled,
    Always,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandlerKind::Success => "success",
            HandlerKind::Failure => "failure",
            HandlerKind::Canceled => "canceled",
            HandlerKind::Always => "always",
        })
    }
}

/// The four handler queues of a pending promise, each in registration order.
#[derive(Default)]
pub(crate) struct Handlers {
    pub(crate) success: Vec<SuccessHandler>,
    pub(crate) failure: Vec<FailureHandler>,
    pub(crate) canceled: Vec<CanceledHandler>,
    pub(crate) always: Vec<AlwaysHandler>,
}

impl Handlers {
    pub(crate) fn len(&self) -> usize {
        self.success.len() + self.failure.len() + self.canceled.len() + self.always.len()
    }

    /// Notifies every handler that applies to `outcome`.
    ///
    /// Success, failure and cancellation handlers run before always
    /// handlers. A canceled promise runs its failure handlers and then its
    /// cancellation handlers. Returns how many handlers panicked.
    pub(crate) fn dispatch(self, promise: &Controller, outcome: &Outcome) -> usize {
        let mut panicked = 0;
        match outcome {
            Outcome::Success(value) => {
                for handler in self.success {
                    let value = value.clone();
                    panicked += usize::from(!guarded(HandlerKind::Success, move || handler(value)));
                }
            }
            Outcome::Failure(err) => {
                for handler in self.failure {
                    let err = err.clone();
                    panicked += usize::from(!guarded(HandlerKind::Failure, move || handler(err)));
                }
                if err.is_canceled() {
                    for handler in self.canceled {
                        panicked += usize::from(!guarded(HandlerKind::Canceled, handler));
                    }
                }
            }
        }

        for handler in self.always {
            let promise = promise.clone();
            panicked += usize::from(!guarded(HandlerKind::Always, move || handler(promise)));
        }
        panicked
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("success", &self.success.len())
            .field("failure", &self.failure.len())
            .field("canceled", &self.canceled.len())
            .field("always", &self.always.len())
            .finish()
    }
}

/// Runs one handler, containing any panic it raises.
///
/// Returns `false` if the handler panicked.
pub(crate) fn guarded<F: FnOnce()>(kind: HandlerKind, handler: F) -> bool {
    match catch_unwind(AssertUnwindSafe(handler)) {
        Ok(()) => true,
        Err(payload) => {
            tracing::error!(
                handler = %kind,
                panic = panic_message(payload.as_ref()),
                "promise handler panicked"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
