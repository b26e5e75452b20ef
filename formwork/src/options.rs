/// How to treat boolean values outside the recognized literal set.
///
/// `true`, `TRUE`, `True` and `1` are always true; `false`, `FALSE`, `False`
/// and `0` are always false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BoolParsing {
    /// Anything else is true (`on`, `yes`, `tru`, the empty string).
    #[default]
    Permissive,

    /// Anything else is a conversion error.
    Strict,
}

impl BoolParsing {
    /// Converts `raw` under this policy. `None` means "rejected".
    pub fn parse(self, raw: &str) -> Option<bool> {
        match raw {
            "true" | "TRUE" | "True" | "1" => Some(true),
            "false" | "FALSE" | "False" | "0" => Some(false),
            _ => match self {
                BoolParsing::Permissive => Some(true),
                BoolParsing::Strict => None,
            },
        }
    }
}

/// Runtime knobs for [`unmarshal_with`](crate::unmarshal_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// Policy for boolean values outside the literal set.
    pub bool_parsing: BoolParsing,
}

impl DecodeOptions {
    /// The defaults: permissive booleans.
    pub const fn new() -> Self {
        Self {
            bool_parsing: BoolParsing::Permissive,
        }
    }

    /// Sets the boolean policy.
    pub const fn with_bool_parsing(mut self, bool_parsing: BoolParsing) -> Self {
        self.bool_parsing = bool_parsing;
        self
    }
}
