use alloc::vec::Vec;

use formwork_core::{Field, Shape, Type};

use crate::TypeError;

/// A field that can be decoded, and how to reach it from the root record.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The external name (the form key).
    pub name: &'static str,

    /// Flattened fields crossed on the way, outermost first. Empty for a
    /// field declared directly on the root record.
    pub prefix: Vec<&'static Field>,

    /// The field itself.
    pub field: &'static Field,
}

impl FieldDescriptor {
    /// The full accessor path from the root record, ending with [`Self::field`].
    pub fn path(&self) -> impl Iterator<Item = &'static Field> + '_ {
        self.prefix.iter().copied().chain(core::iter::once(self.field))
    }
}

/// The decodable fields of a record, in declaration order, with flattened
/// records spliced in place.
///
/// Several descriptors may share an external name; the decoder binds the
/// first one only.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    descriptors: Vec<FieldDescriptor>,
}

impl Catalog {
    /// Lists the decodable fields of the record described by `shape`.
    pub fn build(shape: &'static Shape) -> Result<Self, TypeError> {
        let Some(fields) = shape.fields() else {
            return Err(TypeError::NotARecord { shape });
        };

        let mut catalog = Catalog::default();
        let mut prefix = Vec::new();
        let mut open = Vec::from([shape]);
        catalog.collect(fields, &mut prefix, &mut open);
        tracing::trace!(%shape, fields = catalog.len(), "built field catalog");
        Ok(catalog)
    }

    fn collect(
        &mut self,
        fields: &'static [Field],
        prefix: &mut Vec<&'static Field>,
        open: &mut Vec<&'static Shape>,
    ) {
        for field in fields {
            if let Some(embedded) = flatten_target(field) {
                if open.contains(&embedded) {
                    tracing::debug!(field = field.name, shape = %embedded, "not flattening a record into itself");
                    continue;
                }
                let Some(nested) = embedded.fields() else {
                    continue;
                };
                tracing::trace!(field = field.name, shape = %embedded, "flattening");
                prefix.push(field);
                open.push(embedded);
                self.collect(nested, prefix, open);
                open.pop();
                prefix.pop();
                continue;
            }

            let Some(name) = field.rename() else {
                continue;
            };
            self.descriptors.push(FieldDescriptor {
                name,
                prefix: prefix.clone(),
                field,
            });
        }
    }

    /// Descriptors in catalog order.
    pub fn iter(&self) -> core::slice::Iter<'_, FieldDescriptor> {
        self.descriptors.iter()
    }

    /// The first descriptor bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Number of descriptors, duplicates included.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True if no field can be decoded.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a FieldDescriptor;
    type IntoIter = core::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The record a field flattens into: the field must carry `flatten` and no
/// external name (an empty one counts as none), and be a record directly or behind one indirection.
fn flatten_target(field: &Field) -> Option<&'static Shape> {
    if !field.is_flattened() || field.rename().is_some() {
        return None;
    }
    let shape = field.shape();
    match shape.ty {
        Type::Struct(_) => Some(shape),
        Type::Pointer(def) if def.pointee().is_struct() => Some(def.pointee()),
        _ => None,
    }
}
