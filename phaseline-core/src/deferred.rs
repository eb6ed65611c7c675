//! Once-computed values.
//!
//! Subjects often carry content that is expensive to produce (formatting,
//! serialization) and may never be needed if an early interceptor finishes
//! the chain. [`Deferred`] holds either the initializer or its result and
//! runs the initializer at most once, on first access.

use std::fmt;

type Init<T> = Box<dyn FnOnce() -> T + Send>;

/// A value that is computed on first access and cached afterwards.
///
/// # Example
///
/// ```
/// use phaseline_core::Deferred;
///
/// let mut content = Deferred::new(|| format!("{}-{}", "user", 42));
/// assert!(!content.is_ready());
/// assert_eq!(content.get(), "user-42");
/// assert!(content.is_ready());
/// ```
pub struct Deferred<T> {
    value: Option<T>,
    init: Option<Init<T>>,
}

impl<T> Deferred<T> {
    /// Create a value that will be computed by `init` on first access.
    pub fn new(init: impl FnOnce() -> T + Send + 'static) -> Self {
        Self {
            value: None,
            init: Some(Box::new(init)),
        }
    }

    /// Create an already computed value.
    pub fn ready(value: T) -> Self {
        Self {
            value: Some(value),
            init: None,
        }
    }

    /// Returns true once the value has been computed or set.
    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    /// Compute the value if needed and return it.
    pub fn get(&mut self) -> &T {
        self.force()
    }

    /// Compute the value if needed and return it mutably.
    pub fn get_mut(&mut self) -> &mut T {
        self.force()
    }

    /// Replace the value, discarding a pending initializer without running it.
    pub fn set(&mut self, value: T) {
        self.init = None;
        self.value = Some(value);
    }

    /// Compute the value if needed and take it.
    pub fn into_inner(mut self) -> T {
        self.force();
        match self.value {
            Some(value) => value,
            None => unreachable!("forced deferred value is always present"),
        }
    }

    fn force(&mut self) -> &mut T {
        if let Some(init) = self.init.take() {
            return self.value.insert(init());
        }
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("deferred value has neither an initializer nor a value"),
        }
    }
}

impl<T> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Self::ready(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => f.debug_tuple("Deferred").field(value).finish(),
            None => f.write_str("Deferred(<pending>)"),
        }
    }
}
