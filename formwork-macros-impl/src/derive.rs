use proc_macro2::{Span, TokenStream as TokenStream2, TokenTree as TT};
use quote::{format_ident, quote, quote_spanned};
use unsynn::*;

keyword! {
    KStruct = "struct";
    KPub = "pub";
    KForm = "form";
    KRename = "rename";
    KFlatten = "flatten";
    KTransparent = "transparent";
}

operator! {
    Equals = "=";
}

unsynn! {
    /// Visibility: `pub`, `pub(...)` or nothing
    enum Vis {
        PubIn(Cons<KPub, ParenthesisGroup>),
        Pub(KPub),
    }

    /// An attribute: `#[...]`
    struct Attribute {
        _pound: Pound,
        content: BracketGroup,
    }

    /// A struct definition, fields left as a raw group
    struct StructDef {
        attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        _kw_struct: KStruct,
        name: Ident,
        body: StructBody,
    }

    /// Struct body: braces, parentheses or nothing
    enum StructBody {
        Named(BraceGroup),
        Tuple(Cons<ParenthesisGroup, Semicolon>),
        Unit(Semicolon),
    }

    /// A named field, split off the body at its top-level comma
    struct NamedField {
        attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        name: Ident,
        _colon: Colon,
        ty: Vec<TokenTree>,
    }

    /// A positional field
    struct TupleField {
        attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        ty: Vec<TokenTree>,
    }

    /// `form(...)`, the content of a `#[form(...)]` attribute
    struct FormAttr {
        _form: KForm,
        args: ParenthesisGroupContaining<CommaDelimitedVec<FormArg>>,
    }

    /// One argument of `#[form(...)]`
    enum FormArg {
        Rename(RenameArg),
        Flatten(KFlatten),
        Transparent(KTransparent),
    }

    /// `rename = "name"`
    struct RenameArg {
        _rename: KRename,
        _eq: Equals,
        name: LiteralString,
    }
}

/// A compile error, reported at `span`.
#[derive(Debug, Clone)]
struct CompileError {
    message: String,
    span: Span,
}

impl CompileError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    fn into_tokens(self) -> TokenStream2 {
        let message = self.message;
        quote_spanned! { self.span =>
            ::core::compile_error!(#message);
        }
    }
}

/// A parsed `#[form(...)]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FormKey {
    Rename(String),
    Flatten,
    Transparent,
}

/// A struct field, as the emitter needs it.
struct PField {
    /// `a` or `0`, for `this.#member`
    member: TokenStream2,
    /// `"a"` or `"0"`
    name: String,
    ty: TokenStream2,
    span: Span,
    rename: Option<String>,
    flatten: bool,
}

impl PField {
    /// Fields without form metadata are never decoded and get the opaque
    /// shape without probing their type.
    fn is_tagged(&self) -> bool {
        self.flatten || self.rename.as_deref().is_some_and(|name| !name.is_empty())
    }
}

/// Expands `#[derive(Formable)]`.
pub fn derive_formable(input: TokenStream2) -> TokenStream2 {
    match expand(input) {
        Ok(tokens) => tokens,
        Err(err) => err.into_tokens(),
    }
}

fn expand(input: TokenStream2) -> std::result::Result<TokenStream2, CompileError> {
    reject_unsupported(&input)?;

    let mut iter = input.to_token_iter();
    let parsed: Cons<StructDef, EndOfStream> = iter.parse().map_err(|err| {
        CompileError::new(
            Span::call_site(),
            format!("#[derive(Formable)] could not parse this struct: {err}"),
        )
    })?;
    let def = parsed.first;

    let mut transparent = false;
    for (key, span) in form_args(&def.attrs)? {
        match key {
            FormKey::Transparent => transparent = true,
            FormKey::Rename(_) | FormKey::Flatten => {
                return Err(CompileError::new(
                    span,
                    "`rename` and `flatten` go on fields, not on the struct",
                ));
            }
        }
    }

    let fields = match &def.body {
        StructBody::Named(group) => named_fields(group.0.stream())?,
        StructBody::Tuple(tuple) => tuple_fields(tuple.first.0.stream())?,
        StructBody::Unit(_) => Vec::new(),
    };

    if transparent {
        emit_transparent(&def.name, fields)
    } else {
        Ok(emit_struct(&def.name, &fields))
    }
}

/// Enums, unions and generic structs get a readable error instead of a parse
/// failure.
fn reject_unsupported(input: &TokenStream2) -> std::result::Result<(), CompileError> {
    let tokens: Vec<TT> = input.clone().into_iter().collect();
    for (i, token) in tokens.iter().enumerate() {
        let TT::Ident(ident) = token else {
            continue;
        };
        if ident == "enum" || ident == "union" {
            return Err(CompileError::new(
                ident.span(),
                "#[derive(Formable)] only supports structs",
            ));
        }
        if ident == "struct" {
            if let Some(TT::Punct(punct)) = tokens.get(i + 2)
                && punct.as_char() == '<'
            {
                return Err(CompileError::new(
                    punct.span(),
                    "#[derive(Formable)] does not support generic structs",
                ));
            }
            break;
        }
    }
    Ok(())
}

/// Collects the arguments of every `#[form(...)]` attribute in `attrs`.
fn form_args(attrs: &[Attribute]) -> std::result::Result<Vec<(FormKey, Span)>, CompileError> {
    let mut out = Vec::new();
    for attr in attrs {
        let stream = attr.content.0.stream();
        let span = attr.content.0.span();
        match stream.clone().into_iter().next() {
            Some(TT::Ident(ident)) if ident == "form" => {}
            _ => continue,
        }

        let mut iter = stream.to_token_iter();
        let parsed: Cons<FormAttr, EndOfStream> = iter.parse().map_err(|_| {
            CompileError::new(
                span,
                "unknown form attribute, expected `rename = \"...\"`, `flatten` or `transparent`",
            )
        })?;
        for arg in parsed.first.args.content.iter() {
            let key = match &arg.value {
                FormArg::Rename(rename) => {
                    let literal = rename.name.value();
                    let name = string_value(&literal[..])
                        .map_err(|message| CompileError::new(span, message))?;
                    FormKey::Rename(name)
                }
                FormArg::Flatten(_) => FormKey::Flatten,
                FormArg::Transparent(_) => FormKey::Transparent,
            };
            out.push((key, span));
        }
    }
    Ok(out)
}

/// The value of a string literal token: quotes removed, escapes resolved,
/// raw strings (`r"..."`, `r#"..."#`) taken verbatim.
fn string_value(literal: &str) -> std::result::Result<String, String> {
    if let Some(raw) = literal.strip_prefix('r') {
        let hashes = raw.len() - raw.trim_start_matches('#').len();
        let fence = "#".repeat(hashes);
        return raw
            .strip_prefix(&fence)
            .and_then(|s| s.strip_suffix(&fence))
            .and_then(|s| s.strip_prefix('"'))
            .and_then(|s| s.strip_suffix('"'))
            .map(str::to_string)
            .ok_or_else(|| format!("malformed raw string literal {literal}"));
    }

    let Some(body) = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return Err(format!("expected a string literal, found {literal}"));
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                u8::from_str_radix(&hex, 16)
                    .ok()
                    .filter(u8::is_ascii)
                    .map(char::from)
                    .ok_or_else(|| format!("invalid `\\x` escape in {literal}"))?
            }
            Some('u') => {
                let digits: String = chars
                    .by_ref()
                    .skip_while(|&c| c == '{')
                    .take_while(|&c| c != '}')
                    .collect();
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid `\\u` escape in {literal}"))?
            }
            _ => return Err(format!("unsupported escape in {literal}")),
        };
        out.push(escaped);
    }
    Ok(out)
}

/// Splits a field list at its top-level commas. Commas inside `<...>` belong
/// to the type; `->` is not a closing angle bracket.
fn split_fields(stream: TokenStream2) -> Vec<TokenStream2> {
    let mut chunks = Vec::new();
    let mut current: Vec<TT> = Vec::new();
    let mut depth = 0usize;
    let mut after_dash = false;

    for token in stream {
        let mut dash = false;
        if let TT::Punct(punct) = &token {
            match punct.as_char() {
                '<' => depth += 1,
                '>' if !after_dash => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    chunks.push(current.drain(..).collect());
                    after_dash = false;
                    continue;
                }
                '-' => dash = true,
                _ => {}
            }
        }
        after_dash = dash;
        current.push(token);
    }
    if !current.is_empty() {
        chunks.push(current.into_iter().collect());
    }
    chunks
}

fn first_span(stream: &TokenStream2) -> Span {
    stream
        .clone()
        .into_iter()
        .next()
        .map(|t| t.span())
        .unwrap_or_else(Span::call_site)
}

fn named_fields(body: TokenStream2) -> std::result::Result<Vec<PField>, CompileError> {
    let mut fields = Vec::new();
    for chunk in split_fields(body) {
        let span = first_span(&chunk);
        let mut iter = chunk.to_token_iter();
        let field: NamedField = iter
            .parse()
            .map_err(|_| CompileError::new(span, "could not parse this field"))?;

        let raw = field.name.to_string();
        let name = raw.strip_prefix("r#").unwrap_or(&raw).to_string();
        let ident = &field.name;
        let (rename, flatten) = field_args(&field.attrs)?;
        fields.push(PField {
            member: quote! { #ident },
            name,
            ty: type_tokens(&field.ty, span)?,
            span: ident.span(),
            rename,
            flatten,
        });
    }
    Ok(fields)
}

fn tuple_fields(body: TokenStream2) -> std::result::Result<Vec<PField>, CompileError> {
    let mut fields = Vec::new();
    for (index, chunk) in split_fields(body).into_iter().enumerate() {
        let span = first_span(&chunk);
        let mut iter = chunk.to_token_iter();
        let field: TupleField = iter
            .parse()
            .map_err(|_| CompileError::new(span, "could not parse this field"))?;

        let member = proc_macro2::Literal::usize_unsuffixed(index);
        let (rename, flatten) = field_args(&field.attrs)?;
        fields.push(PField {
            member: quote! { #member },
            name: index.to_string(),
            ty: type_tokens(&field.ty, span)?,
            span,
            rename,
            flatten,
        });
    }
    Ok(fields)
}

fn type_tokens(ty: &[TT], span: Span) -> std::result::Result<TokenStream2, CompileError> {
    if ty.is_empty() {
        return Err(CompileError::new(span, "expected a type"));
    }
    Ok(quote! { #(#ty)* })
}

fn field_args(
    attrs: &[Attribute],
) -> std::result::Result<(Option<String>, bool), CompileError> {
    let mut rename = None;
    let mut flatten = false;
    for (key, span) in form_args(attrs)? {
        match key {
            FormKey::Rename(name) => {
                if rename.is_some() {
                    return Err(CompileError::new(span, "duplicate `rename`"));
                }
                rename = Some(name);
            }
            FormKey::Flatten => flatten = true,
            FormKey::Transparent => {
                return Err(CompileError::new(
                    span,
                    "`transparent` goes on the struct, not on a field",
                ));
            }
        }
    }
    Ok((rename, flatten))
}

fn accessor(struct_name: &Ident, access: &Ident, member: &TokenStream2) -> TokenStream2 {
    quote! {
        fn #access(
            this: &mut dyn ::core::any::Any,
        ) -> ::core::result::Result<&mut dyn ::core::any::Any, ::formwork::ReflectError> {
            match this.downcast_mut::<#struct_name>() {
                ::core::option::Option::Some(this) => {
                    ::core::result::Result::Ok(&mut this.#member as &mut dyn ::core::any::Any)
                }
                ::core::option::Option::None => {
                    ::core::result::Result::Err(::formwork::ReflectError::WrongType {
                        expected: ::core::any::type_name::<#struct_name>(),
                    })
                }
            }
        }
    }
}

fn emit_impl(struct_name: &Ident, items: TokenStream2, ty: TokenStream2) -> TokenStream2 {
    let type_identifier = struct_name.to_string();
    quote! {
        #[automatically_derived]
        impl ::formwork::Formable for #struct_name {
            const SHAPE: &'static ::formwork::Shape = &const {
                #[allow(unused_imports)]
                use ::formwork::__private::ProbeFallback as _;

                #items

                ::formwork::Shape {
                    id: ::core::any::TypeId::of::<#struct_name>,
                    type_identifier: #type_identifier,
                    ty: #ty,
                    vtable: ::formwork::ValueVTable {
                        default: ::formwork::__private::Probe::<#struct_name>::DEFAULT,
                        decode: ::formwork::__private::Probe::<#struct_name>::DECODE,
                    },
                }
            };
        }
    }
}

fn emit_struct(struct_name: &Ident, fields: &[PField]) -> TokenStream2 {
    let mut accessors = Vec::new();
    let mut entries = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let access = format_ident!("__formwork_access_{}", index);
        accessors.push(accessor(struct_name, &access, &field.member));

        let name = &field.name;
        let ty = &field.ty;
        let shape = if field.is_tagged() {
            quote_spanned! { field.span => ::formwork::__private::Probe::<#ty>::SHAPE }
        } else {
            quote! { ::formwork::opaque_shape }
        };
        let rename = match &field.rename {
            Some(rename) => quote! { ::core::option::Option::Some(#rename) },
            None => quote! { ::core::option::Option::None },
        };
        let flatten = field.flatten;

        entries.push(quote! {
            ::formwork::Field {
                name: #name,
                shape: #shape,
                attrs: ::formwork::FieldAttrs {
                    rename: #rename,
                    flatten: #flatten,
                },
                access: #access,
            }
        });
    }

    let items = quote! { #(#accessors)* };
    let ty = quote! {
        ::formwork::Type::Struct(::formwork::StructType {
            fields: &const { [#(#entries),*] },
        })
    };
    emit_impl(struct_name, items, ty)
}

fn emit_transparent(
    struct_name: &Ident,
    fields: Vec<PField>,
) -> std::result::Result<TokenStream2, CompileError> {
    let [field] = <[PField; 1]>::try_from(fields).map_err(|_| {
        CompileError::new(
            struct_name.span(),
            "#[form(transparent)] needs a struct with exactly one field",
        )
    })?;
    if field.rename.is_some() || field.flatten {
        return Err(CompileError::new(
            field.span,
            "the field of a transparent struct takes no form attributes",
        ));
    }

    let access = format_ident!("__formwork_access_0");
    let items = accessor(struct_name, &access, &field.member);
    let inner = &field.ty;
    let ty = quote_spanned! { field.span =>
        ::formwork::Type::Transparent(::formwork::TransparentDef {
            inner: ::formwork::__private::Probe::<#inner>::SHAPE,
            inner_mut: #access,
        })
    };
    Ok(emit_impl(struct_name, items, ty))
}
