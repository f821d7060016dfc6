use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Ident, Path, Visibility};

use crate::variant::Variant;

/// The single point where the held payload is recovered as the erased view.
///
/// Every arm of the generated match binds the payload and coerces it to the
/// view trait object; all arms converge on one returned binding. Forwarders
/// only ever call through [`Accessor::call`].
pub struct Accessor {
    vis: Visibility,
    view: Path,
    patterns: Vec<TokenStream>,
}

impl Accessor {
    pub fn new(vis: &Visibility, variants: &[Variant], view: Path) -> Self {
        let binding = Self::binding();
        Accessor {
            vis: vis.clone(),
            view,
            patterns: variants.iter().map(|v| v.pattern(&binding)).collect(),
        }
    }

    fn binding() -> Ident {
        format_ident!("value")
    }

    pub fn name(mutable: bool) -> Ident {
        if mutable {
            format_ident!("value_mut")
        } else {
            format_ident!("value")
        }
    }

    /// `self.value()` or `self.value_mut()`.
    pub fn call(&self, mutable: bool) -> TokenStream {
        let name = Self::name(mutable);
        quote!(self.#name())
    }

    fn method(&self, mutable: bool) -> TokenStream {
        let Accessor { vis, view, patterns } = self;
        let name = Self::name(mutable);
        let binding = Self::binding();
        let reference = if mutable { quote!(&mut) } else { quote!(&) };
        let receiver = if mutable { quote!(&mut self) } else { quote!(&self) };

        quote! {
            #vis fn #name(#receiver) -> #reference dyn #view {
                let #binding: #reference dyn #view = match self {
                    #(#patterns => #binding,)*
                };
                #binding
            }
        }
    }
}

impl ToTokens for Accessor {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let value = self.method(false);
        let value_mut = self.method(true);
        tokens.extend(quote! {
            /// Returns the held value as the erased trait view.
            #[inline]
            #value

            /// Returns the held value as the mutable erased trait view.
            #[inline]
            #value_mut
        });
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::model::TypeRef;

    fn variant(case: &str, path: Path) -> Variant {
        let name = path.segments.last().unwrap().ident.to_string();
        Variant {
            case_name: format_ident!("{}", case),
            payload: TypeRef { path, name },
        }
    }

    #[test]
    fn converges_on_one_binding() {
        let variants = [
            variant("modelA", parse_quote!(ModelA)),
            variant("modelB", parse_quote!(ModelB)),
        ];
        let view = parse_quote!(__any_proto::ProtoView);
        let accessor = Accessor::new(&parse_quote!(pub), &variants, view);

        let expected = quote! {
            pub fn value(&self) -> &dyn __any_proto::ProtoView {
                let value: &dyn __any_proto::ProtoView = match self {
                    Self::modelA(value) => value,
                    Self::modelB(value) => value,
                };
                value
            }
        };
        assert_eq!(accessor.method(false).to_string(), expected.to_string());

        let expected = quote! {
            pub fn value_mut(&mut self) -> &mut dyn __any_proto::ProtoView {
                let value: &mut dyn __any_proto::ProtoView = match self {
                    Self::modelA(value) => value,
                    Self::modelB(value) => value,
                };
                value
            }
        };
        assert_eq!(accessor.method(true).to_string(), expected.to_string());
    }

    #[test]
    fn calls() {
        let accessor = Accessor::new(&Visibility::Inherited, &[], parse_quote!(View));
        assert_eq!(accessor.call(false).to_string(), quote!(self.value()).to_string());
        assert_eq!(accessor.call(true).to_string(), quote!(self.value_mut()).to_string());
    }
}
