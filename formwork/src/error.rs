use core::fmt;
use core::num::ParseIntError;

use formwork_core::{BoxError, ReflectError, Shape};

/// Everything that can go wrong while decoding a form into a record.
#[derive(Debug)]
#[non_exhaustive]
pub enum FormError {
    /// The destination, or one of its fields, cannot be decoded into.
    Type(TypeError),

    /// A raw value could not be converted to its field's type.
    Conversion(ConversionError),

    /// The parameter set could not be read from its source.
    Source(SourceError),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Type(err) => write!(f, "{err}"),
            FormError::Conversion(err) => write!(f, "{err}"),
            FormError::Source(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for FormError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            FormError::Type(err) => core::error::Error::source(err),
            FormError::Conversion(err) => core::error::Error::source(err),
            FormError::Source(err) => core::error::Error::source(err),
        }
    }
}

impl From<TypeError> for FormError {
    fn from(err: TypeError) -> Self {
        FormError::Type(err)
    }
}

impl From<ConversionError> for FormError {
    fn from(err: ConversionError) -> Self {
        FormError::Conversion(err)
    }
}

impl From<SourceError> for FormError {
    fn from(err: SourceError) -> Self {
        FormError::Source(err)
    }
}

/// The destination type does not fit the decoder. These are programming
/// errors: retrying with other input will not help.
#[derive(Debug)]
#[non_exhaustive]
pub enum TypeError {
    /// The destination is not a record (a struct with fields).
    NotARecord {
        /// Shape of the destination.
        shape: &'static Shape,
    },

    /// A value was supplied for a field whose type has no conversion rule.
    UnsupportedField {
        /// External name of the field.
        field: &'static str,
        /// The type that could not be decoded.
        shape: &'static Shape,
    },

    /// An unset indirection had to be allocated, but the type it points to
    /// has no zero value.
    NoDefault {
        /// External name of the field.
        field: &'static str,
        /// The type that could not be allocated.
        shape: &'static Shape,
    },

    /// A field's shape did not match the value found in it.
    Reflect {
        /// External name of the field.
        field: &'static str,
        /// What the reflection layer reported.
        error: ReflectError,
    },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::NotARecord { shape } => {
                write!(f, "cannot decode a form into {shape}: expected a record")
            }
            TypeError::UnsupportedField { field, shape } => {
                write!(f, "field `{field}`: unsupported type {shape}")
            }
            TypeError::NoDefault { field, shape } => {
                write!(f, "field `{field}`: cannot allocate {shape}, it has no default value")
            }
            TypeError::Reflect { field, error } => write!(f, "field `{field}`: {error}"),
        }
    }
}

impl core::error::Error for TypeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TypeError::Reflect { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A raw value was rejected by its field's conversion rule.
#[derive(Debug)]
pub struct ConversionError {
    /// External name of the field.
    pub field: &'static str,

    /// The raw value, as found in the parameter set.
    pub raw: String,

    /// The type the value was converted to.
    pub shape: &'static Shape,

    /// Why the conversion failed.
    pub reason: ConversionReason,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field `{}`: cannot convert {:?} to {}: {}",
            self.field, self.raw, self.shape, self.reason
        )
    }
}

impl core::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.reason {
            ConversionReason::InvalidInt(err) => Some(err),
            ConversionReason::InvalidBool => None,
            ConversionReason::Custom(err) => Some(&**err),
        }
    }
}

/// Why a conversion failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConversionReason {
    /// Not a base-10 integer, or out of range for the field's width.
    InvalidInt(ParseIntError),

    /// Not a boolean literal (only with [`BoolParsing::Strict`](crate::BoolParsing::Strict)).
    InvalidBool,

    /// A [`FieldDecoder`](crate::FieldDecoder) rejected the value.
    Custom(BoxError),
}

impl fmt::Display for ConversionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionReason::InvalidInt(err) => write!(f, "{err}"),
            ConversionReason::InvalidBool => write!(f, "not a boolean literal"),
            ConversionReason::Custom(err) => write!(f, "{err}"),
        }
    }
}

/// The parameter set could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceError {
    /// A `%` not followed by two hex digits.
    InvalidEscape {
        /// The offending `key=value` segment.
        segment: String,
    },

    /// Percent-decoding produced bytes that are not UTF-8.
    InvalidUtf8 {
        /// The offending segment.
        segment: String,
    },

    /// A `;` inside a segment. Only `&` separates parameters.
    Semicolon {
        /// The offending segment.
        segment: String,
    },

    /// The request body exceeds the size limit.
    BodyTooLarge {
        /// The limit, in bytes.
        limit: usize,
    },

    /// The request body has a media type that cannot be read as a form.
    UnsupportedMediaType {
        /// The media type from `Content-Type`.
        media_type: String,
    },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::InvalidEscape { segment } => {
                write!(f, "invalid percent escape in {segment:?}")
            }
            SourceError::InvalidUtf8 { segment } => {
                write!(f, "invalid UTF-8 after percent-decoding {segment:?}")
            }
            SourceError::Semicolon { segment } => {
                write!(f, "invalid semicolon separator in {segment:?}")
            }
            SourceError::BodyTooLarge { limit } => {
                write!(f, "request body larger than {limit} bytes")
            }
            SourceError::UnsupportedMediaType { media_type } => {
                write!(f, "cannot read a form from a {media_type} body")
            }
        }
    }
}

impl core::error::Error for SourceError {}
