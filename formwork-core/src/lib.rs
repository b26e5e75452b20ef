#![no_std]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod decoder;
pub use decoder::*;

mod error;
pub use error::*;

mod impls;

mod shape;
pub use shape::*;

/// A type that can describe itself to the form decoder.
///
/// Implemented for the primitives, `String`, `Option<T>` and `Box<T>` by this
/// crate, and for records and transparent newtypes by `#[derive(Formable)]`.
pub trait Formable: 'static {
    /// The shape of this type.
    const SHAPE: &'static Shape;
}

/// Returns `T`'s shape. Used as a `fn() -> &'static Shape` in field and
/// pointer definitions, so recursive types do not create const cycles.
pub fn shape_of<T: Formable>() -> &'static Shape {
    T::SHAPE
}
