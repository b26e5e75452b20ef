#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

// The derive emits `::formwork::` paths; this makes them resolve in our own tests.
extern crate self as formwork;

use core::any::Any;
use std::collections::HashSet;

pub use formwork_core::*;
pub use formwork_macros::Formable;

mod bind;

mod catalog;
pub use catalog::*;

mod error;
pub use error::*;

mod options;
pub use options::*;

mod params;
pub use params::*;

#[cfg(feature = "http")]
mod request;
#[cfg(feature = "http")]
pub use request::MAX_BODY_SIZE;

#[doc(hidden)]
pub mod __private {
    pub use formwork_core::{Probe, ProbeFallback};
}

/// Decodes the parameters from `source` into `dest`, with default options.
///
/// See [`unmarshal_with`].
pub fn unmarshal<S, T>(source: &S, dest: &mut T) -> Result<(), FormError>
where
    S: ParamSource + ?Sized,
    T: Formable,
{
    unmarshal_with(source, dest, &DecodeOptions::default())
}

/// Decodes the parameters from `source` into `dest`.
///
/// `T` must be a record; anything else (`Box<Record>`, `Option<Record>`, a
/// primitive) is a [`TypeError::NotARecord`] and `dest` is left untouched.
///
/// Every field whose external name is present receives the first value for
/// that name. Absent names leave their fields as they were. Decoding stops
/// at the first error; fields written before it keep their new values.
pub fn unmarshal_with<S, T>(source: &S, dest: &mut T, options: &DecodeOptions) -> Result<(), FormError>
where
    S: ParamSource + ?Sized,
    T: Formable,
{
    let shape = T::SHAPE;
    if !shape.is_struct() {
        return Err(TypeError::NotARecord { shape }.into());
    }

    let params = source.param_set()?;
    let catalog = Catalog::build(shape)?;

    let root: &mut dyn Any = dest;
    let mut seen = HashSet::new();
    let mut bound = 0usize;
    for descriptor in &catalog {
        if !seen.insert(descriptor.name) {
            tracing::debug!(field = descriptor.name, "skipping duplicate external name");
            continue;
        }
        let Some(raw) = params.get(descriptor.name) else {
            continue;
        };
        bind::bind(root, descriptor, raw, options)?;
        bound += 1;
    }

    tracing::debug!(%shape, bound, "decoded form");
    Ok(())
}

/// Decodes a query string into a fresh `T::default()`.
///
/// ```
/// use formwork::Formable;
///
/// #[derive(Default, Formable)]
/// struct Page {
///     #[form(rename = "n")]
///     number: i64,
/// }
///
/// let page: Page = formwork::from_str("n=3").unwrap();
/// assert_eq!(page.number, 3);
/// ```
pub fn from_str<T: Formable + Default>(query: &str) -> Result<T, FormError> {
    let mut value = T::default();
    unmarshal(query, &mut value)?;
    Ok(value)
}
