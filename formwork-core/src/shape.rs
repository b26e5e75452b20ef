use alloc::boxed::Box;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use crate::{DecodeFn, ReflectError};

/// Projects a type-erased value to one of its parts (a field, the pointee of
/// an indirection, the inside of a newtype).
pub type AccessFn = fn(&mut dyn Any) -> Result<&mut dyn Any, ReflectError>;

/// Produces a type-erased zero value.
pub type DefaultFn = fn() -> Result<Box<dyn Any>, ReflectError>;

/// Schema for a type: what it is made of, and what it can do.
#[derive(Clone, Copy)]
pub struct Shape {
    /// Identity of the type.
    pub id: fn() -> TypeId,

    /// Name of the type, without generic parameters (`Option`, `i64`, `User`).
    pub type_identifier: &'static str,

    /// Structure of the type.
    pub ty: Type,

    /// Operations the type supports.
    pub vtable: ValueVTable,
}

impl Shape {
    /// The [`TypeId`] of the described type.
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    /// Returns the fields if this shape is a record.
    pub fn fields(&self) -> Option<&'static [Field]> {
        match self.ty {
            Type::Struct(st) => Some(st.fields),
            _ => None,
        }
    }

    /// True if this shape describes a record.
    pub fn is_struct(&self) -> bool {
        matches!(self.ty, Type::Struct(_))
    }

    /// If this shape is an indirection, the shape it points to.
    pub fn pointee(&self) -> Option<&'static Shape> {
        match self.ty {
            Type::Pointer(def) => Some(def.pointee()),
            _ => None,
        }
    }

    /// True if a custom field decoder is registered for this shape.
    pub fn has_decoder(&self) -> bool {
        self.vtable.decode.is_some()
    }

    /// Builds the zero value of this shape as a concrete `T`.
    pub fn default_value<T: 'static>(&'static self) -> Result<T, ReflectError> {
        let make = self.vtable.default.ok_or(ReflectError::NoDefault { shape: self })?;
        make()?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| ReflectError::WrongType {
                expected: type_name::<T>(),
            })
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for Shape {}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Type::Pointer(def) => write!(f, "{}<{}>", self.type_identifier, def.pointee()),
            Type::Transparent(def) => write!(f, "{}({})", self.type_identifier, def.inner()),
            _ => f.write_str(self.type_identifier),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type_identifier", &self.type_identifier)
            .field("ty", &self.ty)
            .field("decoder", &self.has_decoder())
            .finish_non_exhaustive()
    }
}

/// The structure of a type.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum Type {
    /// A primitive, decoded by a built-in rule (if one exists for it).
    Scalar(ScalarType),

    /// A record with named or positional fields.
    Struct(StructType),

    /// A single-owner indirection (`Option<T>`, `Box<T>`).
    Pointer(PointerDef),

    /// A newtype that stands for its single inner value.
    Transparent(TransparentDef),

    /// Something formwork knows nothing about.
    Opaque,
}

/// Primitive kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum ScalarType {
    Bool,
    Char,
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    ISize,
    U8,
    U16,
    U32,
    U64,
    U128,
    USize,
    F32,
    F64,
}

impl ScalarType {
    /// True for the signed integer kinds, of every width.
    pub const fn is_signed_integer(self) -> bool {
        matches!(
            self,
            ScalarType::I8
                | ScalarType::I16
                | ScalarType::I32
                | ScalarType::I64
                | ScalarType::I128
                | ScalarType::ISize
        )
    }
}

/// A record: an ordered list of fields.
#[derive(Clone, Copy, Debug)]
pub struct StructType {
    /// Fields in declaration order.
    pub fields: &'static [Field],
}

/// A field of a record.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    /// The Rust name of the field (`"0"`, `"1"` ... for tuple structs).
    pub name: &'static str,

    /// The field's shape.
    pub shape: fn() -> &'static Shape,

    /// Form metadata attached with `#[form(...)]`.
    pub attrs: FieldAttrs,

    /// Projects the parent record to this field.
    pub access: AccessFn,
}

impl Field {
    /// The field's shape.
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    /// The external name this field is decoded from, if it has a non-empty one.
    pub fn rename(&self) -> Option<&'static str> {
        self.attrs.rename.filter(|name| !name.is_empty())
    }

    /// True if the field was marked `#[form(flatten)]`.
    pub fn is_flattened(&self) -> bool {
        self.attrs.flatten
    }

    /// Borrows this field out of its (type-erased) parent record.
    pub fn project<'mem>(&self, parent: &'mem mut dyn Any) -> Result<&'mem mut dyn Any, ReflectError> {
        (self.access)(parent)
    }
}

/// Metadata from `#[form(...)]` on a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldAttrs {
    /// `#[form(rename = "...")]`: the external name.
    pub rename: Option<&'static str>,

    /// `#[form(flatten)]`: promote the fields of this embedded record.
    pub flatten: bool,
}

impl FieldAttrs {
    /// No metadata.
    pub const EMPTY: Self = Self {
        rename: None,
        flatten: false,
    };
}

/// Which kind of indirection a pointer shape is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PointerKind {
    /// `Option<T>`: may be unset.
    Option,
    /// `Box<T>`: always set.
    Box,
}

/// An indirection to another shape.
#[derive(Clone, Copy, Debug)]
pub struct PointerDef {
    /// `Option` or `Box`.
    pub kind: PointerKind,

    /// Shape of the value pointed to.
    pub pointee: fn() -> &'static Shape,

    /// Returns the pointee, allocating its zero value first if the pointer
    /// is unset. A set pointer is reused as is.
    pub materialize: AccessFn,
}

impl PointerDef {
    /// Shape of the value pointed to.
    pub fn pointee(&self) -> &'static Shape {
        (self.pointee)()
    }
}

/// A newtype over a single inner value (`#[form(transparent)]`).
#[derive(Clone, Copy, Debug)]
pub struct TransparentDef {
    /// Shape of the wrapped value.
    pub inner: fn() -> &'static Shape,

    /// Projects the newtype to the wrapped value.
    pub inner_mut: AccessFn,
}

impl TransparentDef {
    /// Shape of the wrapped value.
    pub fn inner(&self) -> &'static Shape {
        (self.inner)()
    }
}

/// Operations a shape supports.
#[derive(Clone, Copy, Debug)]
pub struct ValueVTable {
    /// Builds the zero value, if the type has one.
    pub default: Option<DefaultFn>,

    /// Custom decoder, if the type implements [`FieldDecoder`](crate::FieldDecoder).
    pub decode: Option<DecodeFn>,
}

impl ValueVTable {
    /// A vtable with no operations.
    pub const EMPTY: Self = Self {
        default: None,
        decode: None,
    };
}

/// Shape given to fields that carry no form metadata: they are listed, but
/// never decoded, so their type does not need to be [`Formable`](crate::Formable).
pub static OPAQUE_SHAPE: Shape = Shape {
    id: TypeId::of::<Opaque>,
    type_identifier: "<opaque>",
    ty: Type::Opaque,
    vtable: ValueVTable::EMPTY,
};

enum Opaque {}

/// Returns [`OPAQUE_SHAPE`].
pub fn opaque_shape() -> &'static Shape {
    &OPAQUE_SHAPE
}
