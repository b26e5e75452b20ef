use crate::Shape;

/// Errors raised while navigating a value through its shape.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum ReflectError {
    /// A type-erased value did not have the type its shape promised.
    WrongType {
        /// The name of the type we expected to find.
        expected: &'static str,
    },

    /// An indirection had to be allocated, but its pointee has no zero value
    /// (the type does not implement `Default`).
    NoDefault {
        /// The shape that could not be instantiated.
        shape: &'static Shape,
    },

    /// An invariant of the reflection system was violated.
    InvariantViolation,
}

impl core::fmt::Display for ReflectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReflectError::WrongType { expected } => {
                write!(f, "wrong type: expected a value of type {expected}")
            }
            ReflectError::NoDefault { shape } => {
                write!(f, "cannot allocate a {shape}: it has no default value")
            }
            ReflectError::InvariantViolation => write!(f, "invariant violation"),
        }
    }
}

impl core::error::Error for ReflectError {}
