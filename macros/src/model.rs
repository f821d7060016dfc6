//! The structural input of an expansion.
//!
//! The validator lowers the `syn` tree of the attached trait and of the
//! attribute argument into these types. Everything downstream of the validator
//! works on this model only.

use std::iter;

use either::Either::{Left, Right};
use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, quote};
use syn::{
    Attribute, Generics, Ident, Path, ReturnType, Token, Type, TypeParamBound, Visibility,
    ext::IdentExt,
};

/// A trait being erased.
pub struct Interface {
    pub vis: Visibility,
    pub name: Ident,
    pub capabilities: Vec<Capability>,
    pub members: Vec<Member>,
}

/// A supertrait requirement of the erased trait, re-stated on the generated
/// enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// A std trait that `#[derive]` implements for the enum.
    Derive(Path),
    /// Any other bound; the enum is statically asserted to satisfy it.
    Assert(TypeParamBound),
}

/// A concrete type named in the type list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub path: Path,
    /// The last segment of `path`, without any `r#` prefix.
    pub name: String,
}

impl TypeRef {
    pub fn span(&self) -> Span {
        self.path
            .segments
            .last()
            .map_or_else(Span::call_site, |segment| segment.ident.span())
    }

    /// The path as it is reported at run time, e.g. `models::ModelA`. Raw
    /// identifiers lose their `r#` prefix.
    pub fn display_name(&self) -> String {
        let segments = self
            .path
            .segments
            .iter()
            .map(|segment| segment.ident.unraw().to_string());
        let leading = self.path.leading_colon.map(|_| String::new());
        leading.into_iter().chain(segments).collect::<Vec<_>>().join("::")
    }
}

/// A named parameter of a forwarded method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub label: Ident,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// A `&self` getter without parameters.
    Property(Box<Type>),
    Method {
        params: Vec<Param>,
        output: ReturnType,
    },
}

/// A trait member forwarded by the erased enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Documentation and `cfg` attributes carried over to every generated copy.
    pub attrs: Vec<Attribute>,
    pub unsafety: Option<Token![unsafe]>,
    pub name: Ident,
    /// Lifetime parameters only.
    pub generics: Generics,
    pub receiver: syn::Receiver,
    pub kind: MemberKind,
}

impl Member {
    pub fn is_mut(&self) -> bool {
        self.receiver.mutability.is_some()
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, MemberKind::Property(_))
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        match &self.kind {
            MemberKind::Property(_) => Left(iter::empty()),
            MemberKind::Method { params, .. } => Right(params.iter()),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &Ident> {
        self.params().map(|param| &param.label)
    }

    pub fn output(&self) -> TokenStream {
        match &self.kind {
            MemberKind::Property(ty) => quote!(-> #ty),
            MemberKind::Method { output, .. } => output.to_token_stream(),
        }
    }

    /// The signature shared by the view trait, its blanket impl and the
    /// forwarder: `unsafe fn name<'a>(&'a self, label: Ty) -> Ret where ..`.
    pub fn signature(&self) -> TokenStream {
        let Member {
            unsafety,
            name,
            generics,
            receiver,
            ..
        } = self;
        let (_, _, where_clause) = generics.split_for_impl();
        let params = self.params().map(|Param { label, ty }| quote!(#label: #ty));
        let output = self.output();

        quote! {
            #unsafety fn #name #generics(#receiver #(, #params)*) #output #where_clause
        }
    }
}
