use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Controller, Error};

/// A type-erased success payload.
///
/// Values are reference counted, so handing the same payload to many
/// observers never copies it.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Value {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns a shared handle on the payload if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}

/// The terminal state of a delivered promise.
///
/// `Success(None)` is an empty success, which is still a delivery and is
/// never confused with a pending promise.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Option<Value>),
    Failure(Error),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Failure(err) if err.is_canceled())
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Success(value) => value.as_ref(),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }
}

/// Anything that can be handed to [`Controller::deliver`].
///
/// Plain values succeed, errors fail, and another delivered promise has its
/// outcome copied across.
#[derive(Debug, Clone)]
pub enum Delivery {
    Outcome(Outcome),
    Promise(Controller),
}

impl From<Outcome> for Delivery {
    fn from(outcome: Outcome) -> Self {
        Delivery::Outcome(outcome)
    }
}

impl From<Value> for Delivery {
    fn from(value: Value) -> Self {
        Delivery::Outcome(Outcome::Success(Some(value)))
    }
}

impl From<Option<Value>> for Delivery {
    fn from(value: Option<Value>) -> Self {
        Delivery::Outcome(Outcome::Success(value))
    }
}

impl From<Error> for Delivery {
    fn from(err: Error) -> Self {
        Delivery::Outcome(Outcome::Failure(err))
    }
}

impl From<Result<Value, Error>> for Delivery {
    fn from(result: Result<Value, Error>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => err.into(),
        }
    }
}

impl From<Controller> for Delivery {
    fn from(promise: Controller) -> Self {
        Delivery::Promise(promise)
    }
}

impl From<&Controller> for Delivery {
    fn from(promise: &Controller) -> Self {
        Delivery::Promise(promise.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_downcast() {
        let value = Value::new(12_i32);
        assert!(value.is::<i32>());
        assert_eq!(value.downcast_ref::<i32>(), Some(&12));
        assert_eq!(value.downcast_ref::<u8>(), None);
        assert_eq!(*value.downcast::<i32>().unwrap(), 12);
        assert_eq!(value.type_name(), "i32");
        assert!(value.ptr_eq(&value.clone()));
        assert!(!value.ptr_eq(&Value::new(12_i32)));
    }

    #[test]
    fn test_empty_success_is_still_success() {
        let outcome = Outcome::Success(None);
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert!(outcome.value().is_none());
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_cancel_is_a_failure() {
        let outcome = Outcome::Failure(Error::Canceled);
        assert!(outcome.is_failure());
        assert!(outcome.is_canceled());
        assert_eq!(outcome.error(), Some(&Error::Canceled));
    }

    #[test]
    fn test_delivery_conversions() {
        let ok: Delivery = Ok::<_, Error>(Value::new("hi")).into();
        assert!(matches!(ok, Delivery::Outcome(Outcome::Success(Some(_)))));

        let err: Delivery = Err::<Value, _>(Error::msg("nope")).into();
        assert!(matches!(err, Delivery::Outcome(Outcome::Failure(_))));

        let empty: Delivery = None::<Value>.into();
        assert!(matches!(empty, Delivery::Outcome(Outcome::Success(None))));
    }
}
