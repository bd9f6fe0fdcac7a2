//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations, plus
//! `From` conversions for fields tagged `#[from]`. Replacement for `thiserror`.
//!
//! # Usage
//!
//! ```ignore
//! use hashchain_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum AppError {
//!     #[error("invalid value: expected {expected}, got {actual}")]
//!     InvalidValue { expected: u32, actual: u32 },
//!
//!     #[error("i/o failed: {0}")]
//!     Io(#[from] std::io::Error),
//!
//!     #[error("unknown error")]
//!     Unknown,
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - `#[from]` on the single field of a variant: generates `From<FieldType>`
//!   and reports the field from `Error::source`
//! - `#[source]` on any field: reported from `Error::source` only
//!
//! Only the fields a message references are passed to `write!`, so a variant
//! may carry context its message does not print.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Fields, Generics, Ident, LitStr, Member, Type,
    parse_macro_input,
};

/// Derives `Display`, `Error` and `From` impls for an enum or struct.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A field of a variant or struct, as the generated code sees it.
struct FieldInfo {
    /// Name bound in match patterns and passed as the named format argument.
    binding: Ident,
    /// Accessor from `self` (`self.name` or `self.0`).
    member: Member,
    ty: Type,
    from: bool,
    source: bool,
}

impl FieldInfo {
    fn collect(fields: &Fields) -> Vec<FieldInfo> {
        fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let (binding, member) = match &field.ident {
                    Some(ident) => (ident.clone(), Member::Named(ident.clone())),
                    None => (format_ident!("f{}", i), Member::Unnamed(syn::Index::from(i))),
                };
                FieldInfo {
                    binding,
                    member,
                    ty: field.ty.clone(),
                    from: has_attr(&field.attrs, "from"),
                    source: has_attr(&field.attrs, "source"),
                }
            })
            .collect()
    }

    fn is_source(&self) -> bool {
        self.from || self.source
    }
}

/// A parsed `#[error("...")]` message.
struct Message {
    /// Format string with positional placeholders rewritten to `{fN}`.
    format: String,
    /// Argument names the format string refers to.
    referenced: Vec<String>,
    span: Span,
}

impl Message {
    fn parse(lit: &LitStr) -> Message {
        let raw = lit.value();
        let mut format = String::with_capacity(raw.len());
        let mut referenced = Vec::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    format.push_str("{{");
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    format.push_str("}}");
                }
                '{' => {
                    let mut spec = String::new();
                    for next in chars.by_ref() {
                        if next == '}' {
                            break;
                        }
                        spec.push(next);
                    }
                    let (name, rest) = match spec.find(':') {
                        Some(pos) => spec.split_at(pos),
                        None => (spec.as_str(), ""),
                    };
                    let name = if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
                        format!("f{name}")
                    } else {
                        name.to_string()
                    };
                    format.push('{');
                    format.push_str(&name);
                    format.push_str(rest);
                    format.push('}');
                    if !name.is_empty() && !referenced.contains(&name) {
                        referenced.push(name);
                    }
                }
                other => format.push(other),
            }
        }

        Message {
            format,
            referenced,
            span: lit.span(),
        }
    }

    fn references(&self, binding: &Ident) -> bool {
        let name = binding.to_string();
        self.referenced.iter().any(|r| *r == name)
    }

    fn literal(&self) -> LitStr {
        LitStr::new(&self.format, self.span)
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut from_impls = Vec::new();
    let mut source_arms = Vec::new();

    let display_body = match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::new();
            for variant in &data_enum.variants {
                let ident = &variant.ident;
                let message = extract_message(
                    &variant.attrs,
                    ident,
                    &format!("variant `{}`", ident),
                )?;
                let fields = FieldInfo::collect(&variant.fields);

                display_arms.push(display_arm(ident, &variant.fields, &fields, &message));
                if let Some(arm) = source_arm(ident, &variant.fields, &fields) {
                    source_arms.push(arm);
                }
                if let Some(tokens) =
                    from_impl(name, &input.generics, quote!(Self::#ident), &fields)?
                {
                    from_impls.push(tokens);
                }
            }

            if display_arms.is_empty() {
                quote! { match *self {} }
            } else {
                quote! {
                    match self {
                        #(#display_arms)*
                    }
                }
            }
        }
        Data::Struct(data_struct) => {
            let message = extract_message(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )?;
            let fields = FieldInfo::collect(&data_struct.fields);
            let format = message.literal();
            let args = fields
                .iter()
                .filter(|f| message.references(&f.binding))
                .map(|f| {
                    let binding = &f.binding;
                    let member = &f.member;
                    quote! { #binding = self.#member }
                });

            if let Some(field) = fields.iter().find(|f| f.is_source()) {
                let member = &field.member;
                source_arms.push(quote! {
                    _ => ::std::option::Option::Some(
                        &self.#member as &(dyn ::std::error::Error + 'static)
                    ),
                });
            }
            if let Some(tokens) = from_impl(name, &input.generics, quote!(Self), &fields)? {
                from_impls.push(tokens);
            }

            quote! { ::std::write!(__formatter, #format #(, #args)*) }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    let error_impl = if source_arms.is_empty() {
        quote! {
            impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
        }
    } else {
        quote! {
            impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
                #[allow(unreachable_patterns)]
                fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                    match self {
                        #(#source_arms)*
                        _ => ::std::option::Option::None,
                    }
                }
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, __formatter: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        #error_impl

        #(#from_impls)*
    })
}

/// Builds `Self::Variant { .. } => write!(..)`, binding only referenced fields.
fn display_arm(
    ident: &Ident,
    shape: &Fields,
    fields: &[FieldInfo],
    message: &Message,
) -> TokenStream2 {
    let format = message.literal();
    let used: Vec<&Ident> = fields
        .iter()
        .filter(|f| message.references(&f.binding))
        .map(|f| &f.binding)
        .collect();

    let pattern = match shape {
        Fields::Unit => quote! { Self::#ident },
        Fields::Named(_) => quote! { Self::#ident { #(#used,)* .. } },
        Fields::Unnamed(_) => {
            let slots = fields.iter().map(|f| {
                if message.references(&f.binding) {
                    f.binding.to_token_stream()
                } else {
                    quote! { _ }
                }
            });
            quote! { Self::#ident(#(#slots),*) }
        }
    };

    quote! {
        #pattern => ::std::write!(__formatter, #format #(, #used = #used)*),
    }
}

/// Builds the `Error::source` arm for a variant with a `#[from]`/`#[source]` field.
fn source_arm(ident: &Ident, shape: &Fields, fields: &[FieldInfo]) -> Option<TokenStream2> {
    let position = fields.iter().position(FieldInfo::is_source)?;
    let binding = &fields[position].binding;

    let pattern = match shape {
        Fields::Unit => return None,
        Fields::Named(_) => quote! { Self::#ident { #binding, .. } },
        Fields::Unnamed(_) => {
            let slots = fields.iter().enumerate().map(|(i, f)| {
                if i == position {
                    f.binding.to_token_stream()
                } else {
                    quote! { _ }
                }
            });
            quote! { Self::#ident(#(#slots),*) }
        }
    };

    Some(quote! {
        #pattern => ::std::option::Option::Some(#binding as &(dyn ::std::error::Error + 'static)),
    })
}

/// Builds `impl From<FieldType>` for a single-field variant or struct tagged `#[from]`.
fn from_impl(
    name: &Ident,
    generics: &Generics,
    constructor: TokenStream2,
    fields: &[FieldInfo],
) -> syn::Result<Option<TokenStream2>> {
    let Some(field) = fields.iter().find(|f| f.from) else {
        return Ok(None);
    };
    if fields.len() != 1 {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "#[from] requires the variant to have exactly one field",
        ));
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let ty = &field.ty;
    let body = match &field.member {
        Member::Named(ident) => quote! { #constructor { #ident: source } },
        Member::Unnamed(_) => quote! { #constructor(source) },
    };

    Ok(Some(quote! {
        impl #impl_generics ::std::convert::From<#ty> for #name #ty_generics #where_clause {
            fn from(source: #ty) -> Self {
                #body
            }
        }
    }))
}

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Extracts the message from an `#[error("...")]` attribute.
fn extract_message<T: ToTokens>(
    attrs: &[Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<Message> {
    let attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("error"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                target,
                format!(
                    "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
                    target_desc
                ),
            )
        })?;

    let lit: LitStr = attr.parse_args().map_err(|_| {
        syn::Error::new_spanned(
            attr,
            "invalid #[error] attribute; expected a string literal like #[error(\"hash mismatch: {0}\")]",
        )
    })?;

    Ok(Message::parse(&lit))
}
