use alloc::boxed::Box;
use alloc::string::String;
use core::any::{Any, TypeId, type_name};

use crate::decoder::default_erased;
use crate::{
    Formable, PointerDef, PointerKind, ReflectError, ScalarType, Shape, Type, ValueVTable, shape_of,
};

macro_rules! impl_scalar {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            impl Formable for $ty {
                const SHAPE: &'static Shape = &const {
                    Shape {
                        id: TypeId::of::<$ty>,
                        type_identifier: stringify!($ty),
                        ty: Type::Scalar(ScalarType::$scalar),
                        vtable: ValueVTable {
                            default: Some(default_erased::<$ty>),
                            decode: None,
                        },
                    }
                };
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    char => Char,
    String => String,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => ISize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => USize,
    f32 => F32,
    f64 => F64,
}

fn option_materialize<T: Formable>(this: &mut dyn Any) -> Result<&mut dyn Any, ReflectError> {
    let this = this
        .downcast_mut::<Option<T>>()
        .ok_or(ReflectError::WrongType {
            expected: type_name::<Option<T>>(),
        })?;
    if this.is_none() {
        *this = Some(T::SHAPE.default_value::<T>()?);
    }
    match this {
        Some(inner) => Ok(inner as &mut dyn Any),
        None => Err(ReflectError::InvariantViolation),
    }
}

fn option_default<T: Formable>() -> Result<Box<dyn Any>, ReflectError> {
    Ok(Box::new(None::<T>))
}

impl<T: Formable> Formable for Option<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            id: TypeId::of::<Option<T>>,
            type_identifier: "Option",
            ty: Type::Pointer(PointerDef {
                kind: PointerKind::Option,
                pointee: shape_of::<T>,
                materialize: option_materialize::<T>,
            }),
            vtable: ValueVTable {
                default: Some(option_default::<T>),
                decode: None,
            },
        }
    };
}

fn box_materialize<T: Formable>(this: &mut dyn Any) -> Result<&mut dyn Any, ReflectError> {
    let this = this
        .downcast_mut::<Box<T>>()
        .ok_or(ReflectError::WrongType {
            expected: type_name::<Box<T>>(),
        })?;
    Ok(&mut **this as &mut dyn Any)
}

fn box_default<T: Formable>() -> Result<Box<dyn Any>, ReflectError> {
    let inner = T::SHAPE.default_value::<T>()?;
    Ok(Box::new(Box::new(inner)))
}

impl<T: Formable> Formable for Box<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            id: TypeId::of::<Box<T>>,
            type_identifier: "Box",
            ty: Type::Pointer(PointerDef {
                kind: PointerKind::Box,
                pointee: shape_of::<T>,
                materialize: box_materialize::<T>,
            }),
            vtable: ValueVTable {
                default: Some(box_default::<T>),
                decode: None,
            },
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn scalar_shapes() {
        assert!(matches!(i64::SHAPE.ty, Type::Scalar(ScalarType::I64)));
        assert!(matches!(String::SHAPE.ty, Type::Scalar(ScalarType::String)));
        assert_eq!(bool::SHAPE.type_identifier, "bool");
        assert!(!bool::SHAPE.default_value::<bool>().unwrap());
    }

    #[test]
    fn shapes_compare_by_type() {
        assert_eq!(<Option<i32>>::SHAPE, <Option<i32>>::SHAPE);
        assert_ne!(<Option<i32>>::SHAPE, <Option<i64>>::SHAPE);
        assert_eq!(<Box<i32>>::SHAPE.pointee(), Some(i32::SHAPE));
    }

    #[test]
    fn nested_pointer_display() {
        assert_eq!(<Option<Box<i32>>>::SHAPE.to_string(), "Option<Box<i32>>");
    }

    #[test]
    fn option_materialize_allocates_once() {
        let mut value: Option<i32> = None;
        let def = match <Option<i32>>::SHAPE.ty {
            Type::Pointer(def) => def,
            _ => unreachable!(),
        };

        let inner = (def.materialize)(&mut value).unwrap();
        *inner.downcast_mut::<i32>().unwrap() = 7;
        assert_eq!(value, Some(7));

        // set pointers are reused, not reset to zero
        let inner = (def.materialize)(&mut value).unwrap();
        assert_eq!(*inner.downcast_mut::<i32>().unwrap(), 7);
    }

    #[test]
    fn box_default_wraps_pointee_default() {
        let boxed = <Box<i64>>::SHAPE.default_value::<Box<i64>>().unwrap();
        assert_eq!(*boxed, 0);
    }

    #[test]
    fn materialize_rejects_wrong_type() {
        let mut wrong = 0_u8;
        let def = match <Option<i32>>::SHAPE.ty {
            Type::Pointer(def) => def,
            _ => unreachable!(),
        };
        let err = (def.materialize)(&mut wrong).unwrap_err();
        assert!(matches!(err, ReflectError::WrongType { .. }));
    }
}
