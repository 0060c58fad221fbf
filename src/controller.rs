use std::fmt;
use std::ops::Deref;

use crate::{Delivery, Error, Outcome, Promise, Value, CANCELED};

/// What a promise does when it is delivered a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Redelivery {
    /// Keep the first outcome and log the attempt. Joins rely on this since
    /// several sources may race to deliver the same promise.
    #[default]
    Ignore,
    /// Keep the first outcome, then panic on the losing call.
    Panic,
}

/// The controlling view of a promise: delivery plus state queries.
///
/// A `Controller` derefs to its [`Promise`], so every registration and
/// composition method is available on it too. Delivery is first-writer-wins;
/// each delivery method reports whether its call performed the delivery.
///
/// # Examples
///
/// ```
/// use promise_cell::{Controller, Value};
///
/// let op = Controller::new();
/// assert!(op.is_pending());
///
/// assert!(op.succeed_with_result(Value::new(12)));
/// assert!(!op.fail("too late"));
///
/// assert!(op.is_success());
/// assert_eq!(op.result().unwrap().downcast_ref::<i32>(), Some(&12));
/// ```
///
/// Only the creator holds a `Controller`. The [`Promise`] handed out by
/// [`Controller::promise`] or by a combinator cannot be turned back into
/// one:
///
/// ```compile_fail
/// use promise_cell::{Controller, Promise};
///
/// let joined = Promise::all([Controller::new().promise()]);
/// Controller::from(joined).cancel();
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Controller {
    promise: Promise,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_redelivery(Redelivery::default())
    }

    pub fn with_redelivery(redelivery: Redelivery) -> Self {
        Controller {
            promise: Promise::with_redelivery(redelivery),
        }
    }

    pub(crate) fn from_promise(promise: Promise) -> Self {
        Controller { promise }
    }

    /// Creates a promise that is already delivered.
    pub fn delivered(delivery: impl Into<Delivery>) -> Self {
        let controller = Controller::new();
        controller.deliver(delivery);
        controller
    }

    /// The observer view of this promise.
    pub fn promise(&self) -> Promise {
        self.promise.clone()
    }

    pub fn redelivery(&self) -> Redelivery {
        self.promise.shared.redelivery
    }

    pub fn is_pending(&self) -> bool {
        !self.is_delivered()
    }

    pub fn is_delivered(&self) -> bool {
        self.raw_outcome().is_some()
    }

    /// True once delivered with anything but an error, including an empty
    /// success.
    pub fn is_success(&self) -> bool {
        self.raw_outcome().is_some_and(Outcome::is_success)
    }

    /// True once delivered with an error, cancellation included.
    pub fn is_failed(&self) -> bool {
        self.raw_outcome().is_some_and(Outcome::is_failure)
    }

    /// Alias of [`Controller::is_failed`].
    pub fn is_error(&self) -> bool {
        self.is_failed()
    }

    pub fn is_canceled(&self) -> bool {
        self.raw_outcome().is_some_and(Outcome::is_canceled)
    }

    /// The success payload.
    ///
    /// `None` for a pending or failed promise and for an empty success; use
    /// [`Controller::is_success`] or [`Controller::raw_outcome`] to tell
    /// them apart.
    pub fn result(&self) -> Option<Value> {
        self.raw_outcome().and_then(Outcome::value).cloned()
    }

    /// The stored error, [`CANCELED`] for a canceled promise.
    pub fn error(&self) -> Option<Error> {
        self.raw_outcome().and_then(Outcome::error).cloned()
    }

    /// The stored outcome verbatim, `None` while pending.
    pub fn raw_outcome(&self) -> Option<&Outcome> {
        self.promise.outcome()
    }

    /// Delivers the promise with `true`.
    pub fn succeed(&self) -> bool {
        self.succeed_with_result(Value::new(true))
    }

    /// Delivers the promise with `value`; `None` is an empty success.
    pub fn succeed_with_result(&self, value: impl Into<Option<Value>>) -> bool {
        self.transition(Outcome::Success(value.into()))
    }

    /// Fails the promise. Failing with [`CANCELED`] is a cancellation.
    pub fn fail(&self, err: impl Into<Error>) -> bool {
        self.transition(Outcome::Failure(err.into()))
    }

    pub fn cancel(&self) -> bool {
        self.transition(Outcome::Failure(CANCELED.clone()))
    }

    /// Copies the outcome of another, already delivered, promise.
    ///
    /// # Panics
    ///
    /// Panics if `source` is still pending. Only call this once `source`
    /// has been observed as delivered, e.g. from one of its always handlers.
    pub fn deliver_from(&self, source: &Controller) -> bool {
        match source.raw_outcome() {
            Some(outcome) => self.transition(outcome.clone()),
            None => panic!("cannot deliver with a pending promise"),
        }
    }

    /// Delivers a value, an error or another promise's outcome.
    ///
    /// # Panics
    ///
    /// Panics if handed a pending promise, as [`Controller::deliver_from`].
    pub fn deliver(&self, delivery: impl Into<Delivery>) -> bool {
        match delivery.into() {
            Delivery::Outcome(outcome) => self.transition(outcome),
            Delivery::Promise(source) => self.deliver_from(&source),
        }
    }

    fn transition(&self, outcome: Outcome) -> bool {
        let shared = &self.promise.shared;
        let (handlers, outcome) = {
            let mut handlers = shared.handlers.lock();
            match shared.outcome.try_insert(outcome) {
                Ok(outcome) => (std::mem::take(&mut *handlers), outcome),
                Err(_) => {
                    drop(handlers);
                    return self.redelivered();
                }
            }
        };

        let registered = handlers.len();
        let panicked = handlers.dispatch(self, outcome);
        tracing::trace!(
            success = outcome.is_success(),
            handlers = registered,
            panicked,
            "promise delivered"
        );
        true
    }

    fn redelivered(&self) -> bool {
        match self.redelivery() {
            Redelivery::Ignore => {
                tracing::debug!("attempt to deliver a promise that is already delivered");
                false
            }
            Redelivery::Panic => panic!("attempt to deliver a promise that is already delivered"),
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new()
    }
}

impl Deref for Controller {
    type Target = Promise;

    fn deref(&self) -> &Promise {
        &self.promise
    }
}

impl From<Controller> for Promise {
    fn from(controller: Controller) -> Self {
        controller.promise
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("outcome", &self.raw_outcome())
            .field("redelivery", &self.redelivery())
            .finish()
    }
}
