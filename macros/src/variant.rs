use std::collections::HashSet;

use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, quote};
use syn::Ident;

use crate::{
    error::{Error, ErrorKind, Result},
    model::TypeRef,
};

/// One case of the erased enum, carrying a single payload of the referenced
/// type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub case_name: Ident,
    pub payload: TypeRef,
}

impl Variant {
    /// `Self::modelA(binding)`
    pub fn pattern(&self, binding: &Ident) -> TokenStream {
        let case_name = &self.case_name;
        quote!(Self::#case_name(#binding))
    }

    pub fn from_impl(&self, erased: &Ident) -> TokenStream {
        let Variant { case_name, payload } = self;
        let path = &payload.path;
        quote! {
            impl ::core::convert::From<#path> for #erased {
                fn from(value: #path) -> Self {
                    #erased::#case_name(value)
                }
            }
        }
    }
}

impl ToTokens for Variant {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Variant { case_name, payload } = self;
        let path = &payload.path;
        tokens.extend(quote!(#case_name(#path)));
    }
}

/// Lower-cases the first character of a type name and keeps the rest:
/// `ModelA` becomes `modelA`.
pub fn case_name(type_name: &str) -> std::result::Result<String, ErrorKind> {
    let mut chars = type_name.chars();
    let first = chars.next().ok_or(ErrorKind::EmptyTypeName)?;
    Ok(first.to_lowercase().chain(chars).collect())
}

fn case_ident(case: &str, span: Span) -> Result<Ident> {
    if syn::parse_str::<Ident>(case).is_ok() {
        return Ok(Ident::new(case, span));
    }
    match case {
        "self" | "super" | "crate" | "Self" => Err(Error::new(
            ErrorKind::MalformedArgument("the type name cannot be used as a variant name"),
            span,
        )),
        _ => Ok(Ident::new_raw(case, span)),
    }
}

/// Builds one variant per type reference, in input order.
pub fn variants(types: &[TypeRef]) -> Result<Vec<Variant>> {
    let mut seen = HashSet::new();
    types
        .iter()
        .map(|payload| {
            let span = payload.span();
            let case = case_name(&payload.name).map_err(|kind| Error::new(kind, span))?;
            if !seen.insert(case.clone()) {
                return Err(Error::new(ErrorKind::DuplicateTypeReference(case), span));
            }
            Ok(Variant {
                case_name: case_ident(&case, span)?,
                payload: payload.clone(),
            })
        })
        .collect()
}
