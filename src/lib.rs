//! A thread-safe, callback-driven promise.
//!
//! A promise is delivered exactly once, with a success value, a failure or a
//! cancellation, and notifies its handlers of that outcome: right away if it
//! is already delivered, from the delivering thread otherwise.
//!
//! [`Controller`] delivers and queries a promise; [`Promise`] is the
//! observer view that registers handlers and composes promises with
//! [`Promise::then`], [`Promise::all`] and [`Promise::any`]. Blocking and
//! async callers can wait on a promise with [`Promise::wait`] or `.await`.
//!
//! ```
//! use promise_cell::{Controller, Promise, Value};
//! use std::thread;
//!
//! let download = Controller::new();
//! let producer = download.clone();
//! thread::spawn(move || producer.succeed_with_result(Value::new(vec![0_u8; 64])));
//!
//! let processed = download.then_with_result(|body| {
//!     let len = body.and_then(|b| b.downcast_ref::<Vec<u8>>().map(Vec::len));
//!     Promise::from(Controller::delivered(Value::new(len.unwrap_or(0))))
//! });
//!
//! let done = processed.wait().unwrap();
//! assert_eq!(done.result().unwrap().downcast_ref::<usize>(), Some(&64));
//! ```

mod channel;
mod combinator;
mod controller;
mod error;
mod handler;
mod promise;
mod value;
mod waiter;

pub use channel::Signal;
pub use controller::{Controller, Redelivery};
pub use error::{Error, CANCELED};
pub use promise::Promise;
pub use value::{Delivery, Outcome, Value};
pub use waiter::Waiter;
