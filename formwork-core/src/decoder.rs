use alloc::boxed::Box;
use core::any::{Any, type_name};
use core::fmt;
use core::marker::PhantomData;

use crate::{Formable, ReflectError, Shape, opaque_shape, shape_of};

/// Boxed error returned by a custom field decoder.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Type-erased entry point into a [`FieldDecoder`] impl.
pub type DecodeFn = fn(&mut dyn Any, &str) -> Result<(), DecodeFailure>;

/// Opt-in custom conversion from one raw form value.
///
/// A type implementing this trait is always decoded through it, even when it
/// is also a transparent newtype over a primitive: the built-in rules never
/// run for it. `#[derive(Formable)]` notices the impl on its own, there is
/// nothing to register.
///
/// ```
/// use core::convert::Infallible;
/// use formwork_core::FieldDecoder;
///
/// struct Shout(String);
///
/// impl FieldDecoder for Shout {
///     type Error = Infallible;
///
///     fn decode_field(&mut self, raw: &str) -> Result<(), Self::Error> {
///         self.0 = raw.to_uppercase();
///         Ok(())
///     }
/// }
/// ```
pub trait FieldDecoder {
    /// What goes wrong when the raw value is rejected.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Overwrites `self` with the value decoded from `raw`.
    fn decode_field(&mut self, raw: &str) -> Result<(), Self::Error>;
}

/// Why a type-erased decode call failed.
#[derive(Debug)]
pub enum DecodeFailure {
    /// The value handed to the decoder was not of the expected type.
    Reflect(ReflectError),

    /// The decoder rejected the raw value.
    Rejected(BoxError),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::Reflect(err) => write!(f, "{err}"),
            DecodeFailure::Rejected(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for DecodeFailure {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            DecodeFailure::Reflect(err) => Some(err),
            DecodeFailure::Rejected(err) => Some(&**err),
        }
    }
}

fn decode_erased<T: FieldDecoder + 'static>(
    this: &mut dyn Any,
    raw: &str,
) -> Result<(), DecodeFailure> {
    let this = this
        .downcast_mut::<T>()
        .ok_or(DecodeFailure::Reflect(ReflectError::WrongType {
            expected: type_name::<T>(),
        }))?;
    this.decode_field(raw)
        .map_err(|err| DecodeFailure::Rejected(Box::new(err)))
}

pub(crate) fn default_erased<T: Default + 'static>() -> Result<Box<dyn Any>, ReflectError> {
    Ok(Box::new(T::default()))
}

/// Compile-time capability probe for concrete types.
///
/// `Probe::<T>::DECODE` resolves to the inherent constant when `T` implements
/// [`FieldDecoder`], and to [`ProbeFallback::DECODE`] (`None`) otherwise.
/// Same for `DEFAULT` and [`Default`], and for `SHAPE` and
/// [`Formable`](crate::Formable), which falls back to the opaque shape. Only
/// meaningful for concrete `T`.
#[doc(hidden)]
pub struct Probe<T: ?Sized>(PhantomData<T>);

/// Fallback constants for [`Probe`]; must be in scope at the use site.
#[doc(hidden)]
pub trait ProbeFallback {
    /// No custom decoder.
    const DECODE: Option<DecodeFn> = None;
    /// No zero value.
    const DEFAULT: Option<crate::DefaultFn> = None;
    /// Not `Formable`: listed, but never decoded.
    const SHAPE: fn() -> &'static Shape = opaque_shape;
}

impl<T: ?Sized> ProbeFallback for Probe<T> {}

impl<T: FieldDecoder + 'static> Probe<T> {
    /// The custom decoder for `T`.
    pub const DECODE: Option<DecodeFn> = Some(decode_erased::<T>);
}

impl<T: Formable> Probe<T> {
    /// The shape of `T`.
    pub const SHAPE: fn() -> &'static Shape = shape_of::<T>;
}

impl<T: Default + 'static> Probe<T> {
    /// The zero value for `T`.
    pub const DEFAULT: Option<crate::DefaultFn> = Some(default_erased::<T>);
}
