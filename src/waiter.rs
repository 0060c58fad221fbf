use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

use crate::{Controller, Promise};

/// A future that completes with the promise once it is delivered.
///
/// Any number of waiters may watch the same promise. No runtime is needed:
/// the delivering thread wakes the waiter.
///
/// # Examples
///
/// ```
/// use promise_cell::{Controller, Value};
/// use futures::executor::block_on;
/// use std::thread;
///
/// let op = Controller::new();
/// let waiter = op.promise();
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received {:?}", waiter.await.result());
/// }));
/// op.succeed_with_result(Value::new(String::from("Hi")));
/// task1.join().expect("The task1 thread has panicked.");
/// ```
#[derive(Debug)]
pub struct Waiter {
    promise: Promise,
    waker: Arc<Mutex<Result<Waker, WakerState>>>,
}

#[derive(Debug)]
enum WakerState {
    /// No handler registered yet.
    Fresh,
    /// The handler has run.
    Tainted,
}

impl Waiter {
    fn new(promise: Promise) -> Self {
        Waiter {
            promise,
            waker: Arc::new(Mutex::new(Err(WakerState::Fresh))),
        }
    }
}

fn wake(slot: &Mutex<Result<Waker, WakerState>>) {
    let waker = std::mem::replace(&mut *slot.lock(), Err(WakerState::Tainted));
    if let Ok(waker) = waker {
        waker.wake()
    }
}

impl Future for Waiter {
    type Output = Controller;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.promise.outcome().is_some() {
            return Poll::Ready(self.promise.controller());
        }

        let register = {
            let mut slot = self.waker.lock();
            match std::mem::replace(&mut *slot, Ok(cx.waker().clone())) {
                Err(WakerState::Fresh) => true,
                Err(WakerState::Tainted) => {
                    *slot = Err(WakerState::Tainted);
                    false
                }
                Ok(_) => false,
            }
        };

        // registered outside the slot lock: on a promise delivered in the
        // meantime the handler runs right here
        if register {
            let slot = self.waker.clone();
            self.promise.on_always(move |_| wake(&slot));
        }

        if self.promise.outcome().is_some() {
            Poll::Ready(self.promise.controller())
        } else {
            Poll::Pending
        }
    }
}

impl Promise {
    pub fn waiter(&self) -> Waiter {
        Waiter::new(self.clone())
    }
}

impl IntoFuture for Promise {
    type Output = Controller;
    type IntoFuture = Waiter;

    fn into_future(self) -> Waiter {
        Waiter::new(self)
    }
}

impl IntoFuture for Controller {
    type Output = Controller;
    type IntoFuture = Waiter;

    fn into_future(self) -> Waiter {
        Waiter::new(self.promise())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Value};
    use futures::executor::block_on;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_waiter_resolve() {
        let (op, op_a) = {
            let op = Controller::new();
            let promise = op.promise();
            (op, promise)
        };
        let task1 = thread::spawn(move || block_on(async { op_a.await.result() }));
        let task2 = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            op.succeed_with_result(Value::new(String::from("🍓")))
        });
        assert!(task2.join().expect("The task2 thread has panicked"));
        let value = task1.join().expect("The task1 thread has panicked");
        assert_eq!(
            value.unwrap().downcast_ref::<String>().map(String::as_str),
            Some("🍓")
        );
    }

    #[test]
    fn test_waiter_already_delivered() {
        let op = Controller::delivered(Error::msg("reject!!"));
        let delivered = block_on(op.waiter());
        assert!(delivered.is_failed());
        assert_eq!(delivered.error(), op.error());
    }

    #[test]
    fn test_two_waiters() {
        let op = Controller::new();
        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let waiter = op.waiter();
                thread::spawn(move || block_on(waiter).is_canceled())
            })
            .collect();
        op.cancel();
        for task in tasks {
            assert!(task.join().expect("The waiter thread has panicked"));
        }
    }

    #[test]
    fn test_repolling_registers_once() {
        let op = Controller::new();
        let mut waiter = op.waiter();
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut waiter).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut waiter).poll(&mut cx).is_pending());
        assert_eq!(op.shared.handlers.lock().always.len(), 1);

        op.succeed();
        assert!(Pin::new(&mut waiter).poll(&mut cx).is_ready());
    }
}
