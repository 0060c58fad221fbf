//! Blocking bridge: reports delivery on a `std::sync::mpsc` channel.
//!
//! The delivered promise is sent from an always handler, so it is sent by
//! whichever thread delivers the promise, or by the registering thread when
//! the promise is already delivered. A zero-capacity `sync_channel` whose
//! only receiver is that same thread will therefore deadlock; use an
//! unbounded `channel` or give the `sync_channel` room for the message.
//!
use std::sync::mpsc::{sync_channel, Receiver, RecvError, Sender, SyncSender};

use crate::{Controller, Promise};

/// A sink that is told, once, which promise was delivered.
pub trait Signal: Send + 'static {
    fn notify(self, promise: Controller);
}

impl Signal for Sender<Controller> {
    fn notify(self, promise: Controller) {
        if self.send(promise).is_err() {
            tracing::warn!("promise signal receiver dropped before delivery");
        }
    }
}

impl Signal for SyncSender<Controller> {
    /// Blocks the delivering thread while the channel is full.
    fn notify(self, promise: Controller) {
        if self.send(promise).is_err() {
            tracing::warn!("promise signal receiver dropped before delivery");
        }
    }
}

impl Promise {
    /// Sends the delivered promise to `signal` without blocking the caller.
    pub fn signal<S: Signal>(&self, signal: S) -> &Self {
        self.on_always(move |promise| signal.notify(promise))
    }

    /// Signals `sender`, then blocks on `receiver` until a promise arrives.
    ///
    /// `receiver` may carry other signals too; the first message wins.
    pub fn wait_on<S: Signal>(
        &self,
        sender: S,
        receiver: &Receiver<Controller>,
    ) -> Result<Controller, RecvError> {
        self.signal(sender);
        receiver.recv()
    }

    /// Blocks the current thread until this promise is delivered.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::Controller;
    /// use std::thread;
    ///
    /// let op = Controller::new();
    /// let producer = op.clone();
    /// let task = thread::spawn(move || producer.cancel());
    ///
    /// let delivered = op.wait().unwrap();
    /// assert!(delivered.is_canceled());
    /// task.join().expect("The producer thread has panicked");
    /// ```
    pub fn wait(&self) -> Result<Controller, RecvError> {
        let (sender, receiver) = sync_channel(1);
        self.wait_on(sender, &receiver)
    }
}
