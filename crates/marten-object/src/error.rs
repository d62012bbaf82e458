//! VM error types

use crate::value::Value;
use thiserror::Error;

/// Errors surfaced to the language level.
///
/// Protocol-level refusals (defining over a non-configurable property, setting
/// a non-writable one) are not errors: internal methods report them as
/// `Ok(false)`. A `VmError` is what a throwing wrapper turns such a refusal
/// into, or what a getter, setter or native function raised.
#[derive(Debug, Error)]
pub enum VmError {
    /// Type error (e.g., calling non-function)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Range error
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Internal error
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Stack overflow
    #[error("RangeError: Maximum call stack size exceeded")]
    StackOverflow,

    /// Value thrown by a native function
    #[error("Uncaught exception: {0:?}")]
    Exception(Value),
}

impl VmError {
    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a range error
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create an exception from a thrown value
    pub fn exception(value: Value) -> Self {
        Self::Exception(value)
    }

    /// Whether this is a `TypeError`
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::TypeError(_))
    }
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;
