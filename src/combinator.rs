//! Promises derived from other promises.
//!
//! Every combinator hands back the observer view of a fresh *bridge*
//! promise. The combinator delivers the bridge from handlers registered on
//! its sources and never touches it again. Sources that race to deliver the
//! same bridge are harmless since late deliveries are ignored.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::{Controller, Outcome, Promise, Value};

static RESOLVED: Lazy<Controller> = Lazy::new(|| {
    let resolved = Controller::new();
    resolved.succeed();
    resolved
});

impl Promise {
    /// A shared promise that has already succeeded with `true`.
    pub fn resolved() -> Promise {
        RESOLVED.promise()
    }

    /// Follows this promise with `next`.
    ///
    /// The returned promise takes `next`'s outcome once this one succeeds,
    /// or this one's failure (or cancellation) as-is otherwise.
    ///
    /// # Stack depth
    ///
    /// Handlers run on the delivering thread, so resolving a chain of
    /// `then` links nests one dispatch per link on that thread's stack. A
    /// chain of several hundred links can overflow a default 2 MiB thread
    /// stack, sooner in debug builds. Deliver long chains from a thread
    /// with a larger stack, or join the steps with [`Promise::all`].
    pub fn then(&self, next: Promise) -> Promise {
        self.then_with(move || next)
    }

    /// Like [`Promise::then`], building the next promise only once this one
    /// has succeeded.
    ///
    /// # Stack depth
    ///
    /// As for [`Promise::then`], each link adds a nested dispatch when the
    /// chain resolves.
    pub fn then_with<F>(&self, factory: F) -> Promise
    where
        F: FnOnce() -> Promise + Send + 'static,
    {
        self.then_with_result(move |_| factory())
    }

    /// Like [`Promise::then_with`], passing this promise's success payload
    /// to the factory.
    ///
    /// # Stack depth
    ///
    /// As for [`Promise::then`], each link adds a nested dispatch when the
    /// chain resolves.
    pub fn then_with_result<F>(&self, factory: F) -> Promise
    where
        F: FnOnce(Option<Value>) -> Promise + Send + 'static,
    {
        let bridge = Controller::new();
        let promise = bridge.promise();

        self.on_always(move |source| match source.raw_outcome() {
            Some(Outcome::Success(value)) => {
                factory(value.clone()).on_always(move |next| {
                    bridge.deliver_from(&next);
                });
            }
            _ => {
                bridge.deliver_from(&source);
            }
        });

        promise
    }

    /// Succeeds once every promise in `promises` has succeeded.
    ///
    /// The first failure among them, cancellation included, is forwarded
    /// as-is. An empty list gives [`Promise::resolved`].
    pub fn all<I>(promises: I) -> Promise
    where
        I: IntoIterator<Item = Promise>,
    {
        let promises: Vec<Promise> = promises.into_iter().collect();
        if promises.is_empty() {
            return Promise::resolved();
        }

        let bridge = Controller::new();
        let remaining = Arc::new(AtomicUsize::new(promises.len()));

        for promise in promises {
            let target = bridge.clone();
            let remaining = remaining.clone();
            promise.on_always(move |source| {
                if source.is_failed() {
                    target.deliver_from(&source);
                } else if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    target.succeed();
                }
            });

            // a source delivered synchronously may already have decided
            if bridge.is_delivered() {
                break;
            }
        }

        bridge.promise()
    }

    /// Takes the outcome of whichever promise in `promises` is delivered
    /// first. An empty list gives [`Promise::resolved`].
    pub fn any<I>(promises: I) -> Promise
    where
        I: IntoIterator<Item = Promise>,
    {
        let mut promises = promises.into_iter().peekable();
        if promises.peek().is_none() {
            return Promise::resolved();
        }

        let bridge = Controller::new();
        for promise in promises {
            let target = bridge.clone();
            promise.on_always(move |source| {
                target.deliver_from(&source);
            });

            if bridge.is_delivered() {
                break;
            }
        }

        bridge.promise()
    }

    /// Joins `promises` with [`Promise::all`] once this promise succeeds.
    pub fn then_all<I>(&self, promises: I) -> Promise
    where
        I: IntoIterator<Item = Promise>,
    {
        let promises: Vec<Promise> = promises.into_iter().collect();
        self.then_with(move || Promise::all(promises))
    }

    /// Like [`Promise::then_all`], building the list only once this promise
    /// has succeeded.
    pub fn then_all_with<F>(&self, factory: F) -> Promise
    where
        F: FnOnce() -> Vec<Promise> + Send + 'static,
    {
        self.then_with(move || Promise::all(factory()))
    }

    /// Races `promises` with [`Promise::any`] once this promise succeeds.
    pub fn then_any<I>(&self, promises: I) -> Promise
    where
        I: IntoIterator<Item = Promise>,
    {
        let promises: Vec<Promise> = promises.into_iter().collect();
        self.then_with(move || Promise::any(promises))
    }

    pub fn then_any_with<F>(&self, factory: F) -> Promise
    where
        F: FnOnce() -> Vec<Promise> + Send + 'static,
    {
        self.then_with(move || Promise::any(factory()))
    }
}
