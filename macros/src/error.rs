use std::fmt;

use proc_macro2::Span;
use quote::ToTokens;

pub type Result<T> = std::result::Result<T, Error>;

/// The reason an expansion was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The attribute is attached to something that cannot be erased.
    NotAnInterface(&'static str),
    /// The type list argument is missing or has an unexpected shape.
    MalformedArgument(&'static str),
    /// A referenced type has an empty name.
    EmptyTypeName,
    /// Two type references produce the same variant.
    DuplicateTypeReference(String),
    /// A trait member that cannot be forwarded through the erased view.
    UnsupportedMember(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotAnInterface(detail) => {
                write!(f, "`#[type_erasure]` is only usable on a trait: {detail}")
            }
            ErrorKind::MalformedArgument(detail) => write!(
                f,
                "{detail}; list the implementing types like `#[type_erasure([ModelA, ModelB])]`"
            ),
            ErrorKind::EmptyTypeName => f.write_str("type reference has an empty name"),
            ErrorKind::DuplicateTypeReference(case) => {
                write!(f, "type list produces the variant `{case}` more than once")
            }
            ErrorKind::UnsupportedMember(detail) => {
                write!(f, "this trait member cannot be type-erased: {detail}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Error { kind, span }
    }

    pub fn spanned(kind: ErrorKind, tokens: impl ToTokens) -> Self {
        let span = tokens
            .into_token_stream()
            .into_iter()
            .next()
            .map_or_else(Span::call_site, |t| t.span());
        Error { kind, span }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for Error {}

impl From<Error> for syn::Error {
    fn from(err: Error) -> Self {
        syn::Error::new(err.span(), err.kind())
    }
}
