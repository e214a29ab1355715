//! Core traits
//!
//! Kept deliberately small: the engine is a fixed sequence of pure functions,
//! so the only shared abstraction is numeric validity.

use crate::capture::Channel;

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is numerically usable (not NaN, infinite, etc)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for Channel<f64> {
    /// A channel is usable only when present and finite
    fn is_valid(&self) -> bool {
        matches!(self, Channel::Present(v) if v.is_finite())
    }
}

impl<T: Validatable> Validatable for Option<T> {
    /// Absent optional proxies are acceptable; present ones must be valid
    fn is_valid(&self) -> bool {
        self.as_ref().map_or(true, Validatable::is_valid)
    }
}
