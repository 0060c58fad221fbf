use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};

use crate::handler::{guarded, HandlerKind, Handlers};
use crate::{Controller, Error, Outcome, Redelivery, Value};

/// State shared by every view of one promise.
pub(crate) struct Shared {
    /// Written once, under `handlers`, by the delivering call. Reads never
    /// take the lock.
    pub(crate) outcome: OnceCell<Outcome>,
    /// Emptied by the delivering call; stays empty afterwards.
    pub(crate) handlers: Mutex<Handlers>,
    pub(crate) redelivery: Redelivery,
}

/// The observer view of a promise.
///
/// A `Promise` can register handlers and build derived promises but cannot
/// deliver. Clones share the same underlying promise.
///
/// # Examples
///
/// ```
/// use promise_cell::{Controller, Value};
/// use std::sync::mpsc::channel;
/// use std::thread;
///
/// let controller = Controller::new();
/// let (tx, rx) = channel();
///
/// controller
///     .promise()
///     .on_success(|value| println!("received {:?}", value))
///     .on_failure(|err| println!("failed: {}", err))
///     .signal(tx);
///
/// let producer = controller.clone();
/// let task = thread::spawn(move || producer.succeed_with_result(Value::new(String::from("🍓"))));
///
/// let delivered = rx.recv().unwrap();
/// assert!(delivered.is_success());
/// task.join().expect("The producer thread has panicked");
/// ```
#[derive(Clone)]
pub struct Promise {
    pub(crate) shared: Arc<Shared>,
}

impl Promise {
    pub(crate) fn with_redelivery(redelivery: Redelivery) -> Self {
        Promise {
            shared: Arc::new(Shared {
                outcome: OnceCell::new(),
                handlers: Mutex::new(Handlers::default()),
                redelivery,
            }),
        }
    }

    pub(crate) fn outcome(&self) -> Option<&Outcome> {
        self.shared.outcome.get()
    }

    pub(crate) fn controller(&self) -> Controller {
        Controller::from_promise(self.clone())
    }

    /// Locks the handler registry if the promise is still pending.
    ///
    /// Delivery stores the outcome while holding the same lock, so a
    /// handler pushed through the returned guard is always dispatched.
    fn pending_handlers(&self) -> Option<MutexGuard<'_, Handlers>> {
        let handlers = self.shared.handlers.lock();
        if self.shared.outcome.get().is_none() {
            Some(handlers)
        } else {
            None
        }
    }

    /// Registers a handler for a successful delivery.
    ///
    /// If the promise is already successful the handler runs before this
    /// call returns.
    pub fn on_success<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Option<Value>) + Send + 'static,
    {
        match self.pending_handlers() {
            Some(mut handlers) => handlers.success.push(Box::new(handler)),
            None => {
                if let Some(Outcome::Success(value)) = self.outcome() {
                    let value = value.clone();
                    guarded(HandlerKind::Success, move || handler(value));
                }
            }
        }
        self
    }

    /// Registers a handler for a failed delivery, cancellation included.
    pub fn on_failure<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        match self.pending_handlers() {
            Some(mut handlers) => handlers.failure.push(Box::new(handler)),
            None => {
                if let Some(Outcome::Failure(err)) = self.outcome() {
                    let err = err.clone();
                    guarded(HandlerKind::Failure, move || handler(err));
                }
            }
        }
        self
    }

    /// Registers a handler that only runs when the promise is canceled.
    pub fn on_canceled<F>(&self, handler: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        match self.pending_handlers() {
            Some(mut handlers) => handlers.canceled.push(Box::new(handler)),
            None => {
                if self.outcome().is_some_and(Outcome::is_canceled) {
                    guarded(HandlerKind::Canceled, handler);
                }
            }
        }
        self
    }

    /// Registers a handler that runs on any delivery, after the success,
    /// failure and cancellation handlers. It receives the delivered promise.
    pub fn on_always<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Controller) + Send + 'static,
    {
        match self.pending_handlers() {
            Some(mut handlers) => handlers.always.push(Box::new(handler)),
            None => {
                let promise = self.controller();
                guarded(HandlerKind::Always, move || handler(promise));
            }
        }
        self
    }

    /// Whether both views refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Promise {}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("outcome", &self.outcome())
            .field("redelivery", &self.shared.redelivery)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[test]
    fn test_pending_registration_is_deferred() {
        let controller = Controller::new();
        let (calls, seen) = counter();
        controller.on_success(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(controller.shared.handlers.lock().success.len(), 1);

        controller.succeed();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(controller.shared.handlers.lock().len(), 0);
    }

    #[test]
    fn test_post_registration_is_not_stored() {
        let controller = Controller::new();
        controller.cancel();

        let (calls, seen) = counter();
        controller
            .on_success(|_| panic!("not a success"))
            .on_canceled(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(controller.shared.handlers.lock().len(), 0);
    }

    #[test]
    fn test_handler_can_reenter_during_dispatch() {
        let controller = Controller::new();
        let (calls, seen) = counter();
        controller.on_always(move |promise| {
            assert!(promise.is_success());
            promise.on_success(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        });
        controller.succeed();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_views_share_identity() {
        let controller = Controller::new();
        let promise = controller.promise();
        assert_eq!(promise, controller.promise());
        assert_ne!(promise, Controller::new().promise());
        assert!(format!("{:?}", promise).contains("outcome: None"));
    }
}
