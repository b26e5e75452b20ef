#![doc = include_str!("../README.md")]

use quote::quote;
use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    struct UntilFn {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    struct UntilBody {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct FunctionDecl {
        until_fn: UntilFn,
        _fn: KFn,
        name: Ident,
        until_body: UntilBody,
        body: BraceGroup,
    }
}

impl quote::ToTokens for UntilFn {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for UntilBody {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.items.to_tokens(tokens)
    }
}

/// A `#[test]` that installs the formwork test subscriber first.
///
/// ```ignore
/// use formwork_testhelpers::test;
///
/// #[test]
/// fn decodes() {
///     // trace events from formwork show up in the test output
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut iter = item.to_token_iter();
    let decl = match iter.parse::<FunctionDecl>() {
        Ok(decl) => decl,
        Err(err) => {
            let message = format!("#[formwork_testhelpers::test] expects a function: {err}");
            return quote! { ::core::compile_error!(#message); }.into();
        }
    };

    let FunctionDecl {
        until_fn,
        name,
        until_body,
        body,
        ..
    } = decl;
    let body = body.0.stream();

    quote! {
        #[::core::prelude::rust_2024::test]
        #until_fn fn #name #until_body {
            ::formwork_testhelpers::setup();

            #body
        }
    }
    .into()
}
