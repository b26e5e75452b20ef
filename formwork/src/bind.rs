//! Writes one raw value into the field a descriptor points at.

use alloc::borrow::ToOwned;
use alloc::string::String;
use core::any::{Any, type_name};
use core::str::FromStr;

use formwork_core::{DecodeFailure, ReflectError, ScalarType, Shape, Type};
use tracing::trace;

use crate::{ConversionError, ConversionReason, DecodeOptions, FieldDescriptor, FormError, TypeError};

/// Decodes `raw` into the field `descriptor` designates inside `root`.
///
/// Unset indirections on the way are allocated with their zero value; set
/// ones are reused.
pub(crate) fn bind(
    root: &mut dyn Any,
    descriptor: &FieldDescriptor,
    raw: &str,
    options: &DecodeOptions,
) -> Result<(), FormError> {
    let name = descriptor.name;
    let mut slot = root;

    for step in &descriptor.prefix {
        slot = step.project(slot).map_err(|error| reflect(name, error))?;
        if let Type::Pointer(def) = step.shape().ty {
            slot = (def.materialize)(slot).map_err(|error| materialize(name, error))?;
        }
    }

    let mut slot = descriptor
        .field
        .project(slot)
        .map_err(|error| reflect(name, error))?;
    let mut shape = descriptor.field.shape();

    loop {
        if let Some(decode) = shape.vtable.decode {
            trace!(field = name, %shape, "custom decoder");
            return decode(slot, raw).map_err(|failure| match failure {
                DecodeFailure::Reflect(error) => reflect(name, error),
                DecodeFailure::Rejected(err) => {
                    conversion(name, raw, shape, ConversionReason::Custom(err))
                }
            });
        }

        match shape.ty {
            Type::Pointer(def) => {
                trace!(field = name, %shape, "following indirection");
                slot = (def.materialize)(slot).map_err(|error| materialize(name, error))?;
                shape = def.pointee();
            }
            Type::Transparent(def) => {
                slot = (def.inner_mut)(slot).map_err(|error| reflect(name, error))?;
                shape = def.inner();
            }
            Type::Scalar(scalar) => return assign(slot, scalar, shape, name, raw, options),
            _ => return Err(TypeError::UnsupportedField { field: name, shape }.into()),
        }
    }
}

fn assign(
    slot: &mut dyn Any,
    scalar: ScalarType,
    shape: &'static Shape,
    name: &'static str,
    raw: &str,
    options: &DecodeOptions,
) -> Result<(), FormError> {
    trace!(field = name, %shape, raw, "assigning");
    match scalar {
        ScalarType::String => write::<String>(slot, name, raw.to_owned()),
        ScalarType::Bool => match options.bool_parsing.parse(raw) {
            Some(value) => write(slot, name, value),
            None => Err(conversion(name, raw, shape, ConversionReason::InvalidBool)),
        },
        ScalarType::I8 => write(slot, name, int::<i8>(shape, name, raw)?),
        ScalarType::I16 => write(slot, name, int::<i16>(shape, name, raw)?),
        ScalarType::I32 => write(slot, name, int::<i32>(shape, name, raw)?),
        ScalarType::I64 => write(slot, name, int::<i64>(shape, name, raw)?),
        ScalarType::I128 => write(slot, name, int::<i128>(shape, name, raw)?),
        ScalarType::ISize => write(slot, name, int::<isize>(shape, name, raw)?),
        _ => Err(TypeError::UnsupportedField { field: name, shape }.into()),
    }
}

fn int<T>(shape: &'static Shape, name: &'static str, raw: &str) -> Result<T, FormError>
where
    T: FromStr<Err = core::num::ParseIntError>,
{
    raw.parse::<T>()
        .map_err(|err| conversion(name, raw, shape, ConversionReason::InvalidInt(err)))
}

fn write<T: 'static>(slot: &mut dyn Any, name: &'static str, value: T) -> Result<(), FormError> {
    let target = slot.downcast_mut::<T>().ok_or_else(|| {
        reflect(
            name,
            ReflectError::WrongType {
                expected: type_name::<T>(),
            },
        )
    })?;
    *target = value;
    Ok(())
}

fn reflect(field: &'static str, error: ReflectError) -> FormError {
    TypeError::Reflect { field, error }.into()
}

fn materialize(field: &'static str, error: ReflectError) -> FormError {
    match error {
        ReflectError::NoDefault { shape } => TypeError::NoDefault { field, shape }.into(),
        error => reflect(field, error),
    }
}

fn conversion(
    field: &'static str,
    raw: &str,
    shape: &'static Shape,
    reason: ConversionReason,
) -> FormError {
    ConversionError {
        field,
        raw: raw.to_owned(),
        shape,
        reason,
    }
    .into()
}
