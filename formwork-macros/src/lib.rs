#![doc = include_str!("../README.md")]

/// Derives `formwork::Formable` for a struct.
///
/// Field attributes: `#[form(rename = "name")]` binds the field to the form
/// key `name`, `#[form(flatten)]` decodes an embedded record's fields as if
/// they were declared on the parent. Container attribute:
/// `#[form(transparent)]` on a one-field tuple struct.
#[proc_macro_derive(Formable, attributes(form))]
pub fn formable(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    formwork_macros_impl::derive_formable(input.into()).into()
}
