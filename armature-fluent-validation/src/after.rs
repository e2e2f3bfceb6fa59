// Success-only callbacks chained onto a validation

use crate::errors::{ErrorBag, Result, ValidationFailed};

/// Post-validation state of a validated subject
pub trait ValidationState {
    fn fails(&self) -> bool;
    fn errors(&self) -> &ErrorBag;
}

impl<T: ValidationState + ?Sized> ValidationState for &T {
    fn fails(&self) -> bool {
        (**self).fails()
    }

    fn errors(&self) -> &ErrorBag {
        (**self).errors()
    }
}

impl<T: ValidationState + ?Sized> ValidationState for &mut T {
    fn fails(&self) -> bool {
        (**self).fails()
    }

    fn errors(&self) -> &ErrorBag {
        (**self).errors()
    }
}

/// Outcome of a chained validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chained<S, R> {
    /// No callback was registered
    Subject(S),
    /// The callback ran and returned this value
    Returned(R),
}

impl<S, R> Chained<S, R> {
    pub fn is_returned(&self) -> bool {
        matches!(self, Chained::Returned(_))
    }

    pub fn into_subject(self) -> Option<S> {
        match self {
            Chained::Subject(subject) => Some(subject),
            Chained::Returned(_) => None,
        }
    }

    pub fn into_returned(self) -> Option<R> {
        match self {
            Chained::Returned(value) => Some(value),
            Chained::Subject(_) => None,
        }
    }
}

/// Pending success callback.
///
/// The callback runs only when the validation passes. When it fails,
/// [`ValidationFailed`] is returned and the callback is never invoked.
/// Without a callback, a failed validation is returned as-is and callers
/// inspect [`ValidationState::fails`] themselves.
#[derive(Debug, Clone)]
pub struct AfterCallback<F> {
    callback: Option<F>,
}

impl<F> Default for AfterCallback<F> {
    fn default() -> Self {
        Self { callback: None }
    }
}

impl<F> From<Option<F>> for AfterCallback<F> {
    fn from(callback: Option<F>) -> Self {
        Self { callback }
    }
}

impl<F> AfterCallback<F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Store `callback`, or clear the pending one with `None`
    pub fn after<G>(self, callback: Option<G>) -> AfterCallback<G> {
        AfterCallback { callback }
    }

    pub fn is_pending(&self) -> bool {
        self.callback.is_some()
    }

    /// Run `validation`, then the pending callback if it passed
    pub fn run_chained<S, R, V>(self, validation: V) -> Result<Chained<S, R>>
    where
        V: FnOnce() -> Result<S>,
        S: ValidationState,
        F: FnOnce(S) -> R,
    {
        let subject = validation()?;
        match self.callback {
            None => Ok(Chained::Subject(subject)),
            Some(callback) => through(subject, callback).map(Chained::Returned),
        }
    }
}

/// Invoke `callback` with a validated subject, or fail with its errors
pub fn through<S, R, F>(subject: S, callback: F) -> Result<R>
where
    S: ValidationState,
    F: FnOnce(S) -> R,
{
    if subject.fails() {
        return Err(ValidationFailed::new(subject.errors().clone()).into());
    }
    Ok(callback(subject))
}
