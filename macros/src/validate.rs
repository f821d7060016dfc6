use proc_macro2::{Span, TokenStream};
use quote::format_ident;
use syn::{
    ext::IdentExt,
    parse::Parser,
    punctuated::Punctuated,
    visit::{self, Visit},
    *,
};

use crate::{
    error::{Error, ErrorKind, Result},
    model::{Capability, Interface, Member, MemberKind, Param, TypeRef},
};

const DERIVABLE: &[&str] = &[
    "Clone",
    "Copy",
    "Debug",
    "PartialEq",
    "Eq",
    "PartialOrd",
    "Ord",
    "Hash",
];

/// Lowers the attribute argument into the ordered list of type references.
pub fn type_list(args: TokenStream) -> Result<Vec<TypeRef>> {
    if args.is_empty() {
        return Err(Error::new(
            ErrorKind::MalformedArgument("missing type list"),
            Span::call_site(),
        ));
    }

    let args = Punctuated::<Expr, Token![,]>::parse_terminated
        .parse2(args)
        .map_err(|err| {
            Error::new(
                ErrorKind::MalformedArgument("expected a literal array of types"),
                err.span(),
            )
        })?;

    let mut args = args.into_iter();
    let list = match (args.next(), args.next()) {
        (Some(list), None) => list,
        (_, Some(extra)) => {
            return Err(Error::spanned(
                ErrorKind::MalformedArgument("expected a single argument"),
                extra,
            ));
        }
        (None, None) => {
            return Err(Error::new(
                ErrorKind::MalformedArgument("missing type list"),
                Span::call_site(),
            ));
        }
    };

    let Expr::Array(array) = ungroup(&list) else {
        return Err(Error::spanned(
            ErrorKind::MalformedArgument("expected a literal array of types"),
            &list,
        ));
    };
    if array.elems.is_empty() {
        return Err(Error::spanned(
            ErrorKind::MalformedArgument("the type list is empty"),
            array,
        ));
    }

    array.elems.iter().map(type_ref).collect()
}

fn ungroup(expr: &Expr) -> &Expr {
    match expr {
        Expr::Group(group) => ungroup(&group.expr),
        _ => expr,
    }
}

fn type_ref(expr: &Expr) -> Result<TypeRef> {
    let malformed =
        |detail: &'static str| Error::spanned(ErrorKind::MalformedArgument(detail), expr);

    let Expr::Path(ExprPath {
        attrs,
        qself: None,
        path,
    }) = ungroup(expr)
    else {
        return Err(malformed("expected a type, found an expression"));
    };

    if !attrs.is_empty() {
        return Err(malformed("attributes are not allowed on type references"));
    }
    if path.segments.iter().any(|segment| !segment.arguments.is_none()) {
        return Err(malformed("generic arguments are not supported in type references"));
    }
    if path.is_ident("Self") {
        return Err(malformed("`Self` is not a concrete type"));
    }

    let name = match path.segments.last() {
        Some(segment) => segment.ident.unraw().to_string(),
        None => String::new(),
    };

    Ok(TypeRef {
        path: path.clone(),
        name,
    })
}

/// Lowers the attached item into the erased interface.
pub fn interface(item: &Item) -> Result<Interface> {
    let Item::Trait(item) = item else {
        return Err(Error::spanned(
            ErrorKind::NotAnInterface("found an item that is not a trait"),
            item,
        ));
    };

    if let Some(auto_token) = &item.auto_token {
        return Err(Error::spanned(
            ErrorKind::NotAnInterface("auto traits have no members to forward"),
            auto_token,
        ));
    }
    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        return Err(Error::spanned(
            ErrorKind::NotAnInterface("generic traits are not supported"),
            &item.generics,
        ));
    }

    let members = item.items.iter().map(member).collect::<Result<Vec<_>>>()?;

    Ok(Interface {
        vis: item.vis.clone(),
        name: item.ident.clone(),
        capabilities: item.supertraits.iter().map(capability).collect(),
        members,
    })
}

fn capability(bound: &TypeParamBound) -> Capability {
    match bound {
        TypeParamBound::Trait(TraitBound {
            paren_token: None,
            modifier: TraitBoundModifier::None,
            lifetimes: None,
            path,
        }) if is_derivable(path) => Capability::Derive(path.clone()),
        _ => Capability::Assert(bound.clone()),
    }
}

fn is_derivable(path: &Path) -> bool {
    if path.segments.iter().any(|segment| !segment.arguments.is_none()) {
        return false;
    }

    let rooted = match path.segments.first() {
        Some(_) if path.segments.len() == 1 => path.leading_colon.is_none(),
        Some(root) => ["core", "std", "alloc"].iter().any(|krate| root.ident == krate),
        None => false,
    };

    rooted
        && path
            .segments
            .last()
            .is_some_and(|last| DERIVABLE.iter().any(|name| last.ident == name))
}

fn member(item: &TraitItem) -> Result<Member> {
    let unsupported = |detail: &'static str, tokens: &dyn quote::ToTokens| {
        Error::spanned(ErrorKind::UnsupportedMember(detail), tokens)
    };

    let TraitItem::Fn(TraitItemFn { attrs, sig, .. }) = item else {
        let detail = match item {
            TraitItem::Const(_) => "associated constants cannot be read through an erased value",
            TraitItem::Type(_) => "associated types cannot be named through an erased value",
            TraitItem::Macro(_) => "macro invocations cannot be expanded inside an erased trait",
            _ => "unrecognized trait item",
        };
        return Err(unsupported(detail, item));
    };

    let Signature {
        constness,
        asyncness,
        unsafety,
        abi,
        ident,
        generics,
        inputs,
        variadic,
        output,
        ..
    } = sig;

    if let Some(constness) = constness {
        return Err(unsupported("const fns cannot be forwarded", constness));
    }
    if let Some(asyncness) = asyncness {
        return Err(unsupported("async fns are not dyn-compatible", asyncness));
    }
    if let Some(abi) = abi {
        return Err(unsupported("extern fns cannot be forwarded", abi));
    }
    if let Some(variadic) = variadic {
        return Err(unsupported("variadic fns cannot be forwarded", variadic));
    }
    if ident == "value" || ident == "value_mut" {
        return Err(unsupported("the name collides with a generated accessor", ident));
    }
    if let Some(param) = generics
        .params
        .iter()
        .find(|param| !matches!(param, GenericParam::Lifetime(_)))
    {
        return Err(unsupported("type and const generics are not dyn-compatible", param));
    }

    let mut inputs = inputs.iter();
    let receiver = match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.colon_token.is_none() =>
        {
            receiver.clone()
        }
        Some(FnArg::Receiver(receiver)) => {
            return Err(unsupported(
                "only `&self` and `&mut self` receivers can be forwarded",
                receiver,
            ));
        }
        _ => {
            return Err(unsupported(
                "associated functions without a `self` receiver cannot be forwarded",
                ident,
            ));
        }
    };

    let params = inputs
        .enumerate()
        .map(|(index, arg)| match arg {
            FnArg::Typed(PatType { pat, ty, .. }) => Ok(Param {
                label: label(pat, index),
                ty: (**ty).clone(),
            }),
            FnArg::Receiver(receiver) => Err(unsupported("unexpected receiver", receiver)),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut check = SignatureCheck::default();
    check.visit_generics(generics);
    params.iter().for_each(|param| check.visit_type(&param.ty));
    check.visit_return_type(output);
    if let Some(err) = check.err {
        return Err(err);
    }

    let kind = match output {
        ReturnType::Type(_, ty)
            if params.is_empty()
                && generics.params.is_empty()
                && receiver.mutability.is_none() =>
        {
            MemberKind::Property(ty.clone())
        }
        _ => MemberKind::Method {
            params,
            output: output.clone(),
        },
    };

    Ok(Member {
        attrs: attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc") || attr.path().is_ident("cfg"))
            .cloned()
            .collect(),
        unsafety: *unsafety,
        name: ident.clone(),
        generics: generics.clone(),
        receiver,
        kind,
    })
}

fn label(pat: &Pat, index: usize) -> Ident {
    match pat {
        Pat::Ident(PatIdent {
            by_ref: None,
            subpat: None,
            ident,
            ..
        }) => ident.clone(),
        _ => format_ident!("__arg{}", index),
    }
}

/// Rejects signatures that cannot appear on a trait object.
#[derive(Default)]
struct SignatureCheck {
    err: Option<Error>,
}

impl SignatureCheck {
    fn fail(&mut self, detail: &'static str, tokens: &dyn quote::ToTokens) {
        if self.err.is_none() {
            self.err = Some(Error::spanned(ErrorKind::UnsupportedMember(detail), tokens));
        }
    }
}

impl Visit<'_> for SignatureCheck {
    fn visit_path(&mut self, i: &'_ Path) {
        if i.segments.first().is_some_and(|segment| segment.ident == "Self") {
            self.fail("signatures mentioning `Self` are not dyn-compatible", i);
            return;
        }
        visit::visit_path(self, i)
    }

    fn visit_type_impl_trait(&mut self, i: &'_ TypeImplTrait) {
        self.fail("`impl Trait` in a signature is not dyn-compatible", i)
    }

    fn visit_type_macro(&mut self, i: &'_ TypeMacro) {
        self.fail("macros in type position cannot be inspected", i)
    }
}
