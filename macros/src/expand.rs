use std::collections::HashSet;

use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Ident, Item, Path, Visibility, parse_quote};

use crate::{
    accessor::Accessor,
    error::Result,
    forward::{self, Forwarder, View},
    model::{Capability, Interface, TypeRef},
    validate,
    variant::{self, Variant},
};

/// The generated declaration: the erased enum together with its view,
/// accessor, forwarders and capability re-statements.
pub struct ErasedEnum {
    vis: Visibility,
    name: Ident,
    interface: Ident,
    capabilities: Vec<Capability>,
    variants: Vec<Variant>,
    view: View,
    accessor: Accessor,
    forwarders: Vec<Forwarder>,
}

/// `Proto` becomes `AnyProto`.
pub fn erased_name(interface: &Ident) -> Ident {
    format_ident!("Any{}", interface)
}

fn view_module(erased: &Ident) -> Ident {
    format_ident!("__{}", erased.to_string().to_case(Case::Snake))
}

/// The derivable supertraits a derive needs, in the order they are derived.
fn required(name: &str) -> &'static [&'static str] {
    match name {
        "Copy" => &["Clone"],
        "Eq" | "PartialOrd" => &["PartialEq"],
        "Ord" => &["PartialEq", "PartialOrd", "Eq"],
        _ => &[],
    }
}

fn required_path(name: &str) -> Path {
    let module = format_ident!("{}", if name == "Clone" { "clone" } else { "cmp" });
    let name = format_ident!("{}", name);
    parse_quote!(::core::#module::#name)
}

fn derive_name(path: &Path) -> String {
    path.segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default()
}

/// `Eq + Hash` derives `PartialEq, Eq, Hash`: a derive only compiles next to
/// the derives of its supertraits.
fn derive_list<'a>(declared: impl Iterator<Item = &'a Path>) -> Vec<Path> {
    let declared = declared.collect::<Vec<_>>();
    let mut names = declared
        .iter()
        .map(|path| derive_name(path))
        .collect::<HashSet<_>>();

    let mut derives = Vec::new();
    for path in declared {
        for &name in required(&derive_name(path)) {
            if names.insert(name.to_string()) {
                derives.push(required_path(name));
            }
        }
        derives.push(path.clone());
    }
    derives
}

impl ErasedEnum {
    pub fn new(interface: Interface, types: &[TypeRef]) -> Result<Self> {
        let name = erased_name(&interface.name);
        let variants = variant::variants(types)?;
        let view = View::new(&interface, view_module(&name));
        let accessor = Accessor::new(&interface.vis, &variants, view.path());
        let forwarders = forward::forwarders(&interface.vis, &interface.members, &accessor);

        Ok(ErasedEnum {
            vis: interface.vis,
            name,
            interface: interface.name,
            capabilities: interface.capabilities,
            variants,
            view,
            accessor,
            forwarders,
        })
    }

    /// Derivable capabilities go into one `#[derive(..)]`; any other bound
    /// is re-stated as a compile-time assertion on the enum.
    ///
    /// Each group keeps declaration order. The derive list also gains the
    /// derivable supertraits its entries require, placed right before them.
    fn capabilities(&self) -> (Option<TokenStream>, Option<TokenStream>) {
        let declared = self
            .capabilities
            .iter()
            .filter_map(|capability| match capability {
                Capability::Derive(path) => Some(path),
                Capability::Assert(_) => None,
            });
        let derives = derive_list(declared);
        let asserts = self
            .capabilities
            .iter()
            .filter_map(|capability| match capability {
                Capability::Assert(bound) => Some(bound),
                Capability::Derive(_) => None,
            })
            .collect::<Vec<_>>();

        let name = &self.name;
        let derive = (!derives.is_empty()).then(|| quote!(#[derive(#(#derives),*)]));
        let assertion = (!asserts.is_empty()).then(|| {
            quote! {
                const _: fn() = || {
                    fn assert_capabilities<T: ?::core::marker::Sized #(+ #asserts)*>() {}
                    assert_capabilities::<#name>();
                };
            }
        });
        (derive, assertion)
    }

    fn erased_impl(&self) -> TokenStream {
        let ErasedEnum { name, variants, .. } = self;
        let type_names = variants.iter().map(|v| v.payload.display_name());
        let indices = variants.iter().enumerate().map(|(index, v)| {
            let case_name = &v.case_name;
            quote!(Self::#case_name(_) => #index)
        });
        let patterns = variants
            .iter()
            .map(|v| v.pattern(&format_ident!("value")))
            .collect::<Vec<_>>();

        quote! {
            impl ::type_erasure::Erased for #name {
                const TYPE_NAMES: &'static [&'static str] = &[#(#type_names),*];

                #[inline]
                fn variant_index(&self) -> usize {
                    match self {
                        #(#indices,)*
                    }
                }

                fn as_any(&self) -> &dyn ::core::any::Any {
                    let value: &dyn ::core::any::Any = match self {
                        #(#patterns => value,)*
                    };
                    value
                }

                fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                    let value: &mut dyn ::core::any::Any = match self {
                        #(#patterns => value,)*
                    };
                    value
                }
            }
        }
    }
}

impl ToTokens for ErasedEnum {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let ErasedEnum {
            vis,
            name,
            interface,
            variants,
            view,
            accessor,
            forwarders,
            ..
        } = self;

        let doc = format!(" Type-erased [`{interface}`]: one variant per implementing type.");
        let (derive, assertion) = self.capabilities();
        let from_impls = variants.iter().map(|v| v.from_impl(name));
        let erased_impl = self.erased_impl();

        tokens.extend(quote! {
            #view

            #[doc = #doc]
            #derive
            #[allow(non_camel_case_types)]
            #vis enum #name {
                #(#variants,)*
            }

            #assertion

            impl #name {
                #accessor

                #(#forwarders)*
            }

            #(#from_impls)*

            #erased_impl
        });
    }
}

/// Validates the attribute input and builds the erased enum next to the
/// unchanged trait.
pub fn expand(args: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let item: Item = syn::parse2(item)?;
    let interface = validate::interface(&item)?;
    let types = validate::type_list(args)?;
    let erased = ErasedEnum::new(interface, &types)?;

    Ok(quote! {
        #item
        #erased
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn erased(item: Item, args: TokenStream) -> ErasedEnum {
        let interface = validate::interface(&item).unwrap();
        let types = validate::type_list(args).unwrap();
        ErasedEnum::new(interface, &types).unwrap()
    }

    #[test]
    fn names() {
        let name = erased_name(&format_ident!("Proto"));
        assert_eq!(name, "AnyProto");
        assert_eq!(view_module(&name), "__any_proto");
    }

    #[test]
    fn empty_interface() {
        let expanded = expand(quote!([ModelA, ModelB]), quote!(trait Proto {})).unwrap();

        let expected = quote! {
            trait Proto {}

            #[doc(hidden)]
            mod __any_proto {
                #[allow(unused_imports)]
                use super::*;

                #[doc = " The members of [`Proto`] seen through an erased value."]
                pub trait ProtoView {}

                impl<T: super::Proto> ProtoView for T {}
            }

            #[doc = " Type-erased [`Proto`]: one variant per implementing type."]
            #[allow(non_camel_case_types)]
            enum AnyProto {
                modelA(ModelA),
                modelB(ModelB),
            }

            impl AnyProto {
                /// Returns the held value as the erased trait view.
                #[inline]
                fn value(&self) -> &dyn __any_proto::ProtoView {
                    let value: &dyn __any_proto::ProtoView = match self {
                        Self::modelA(value) => value,
                        Self::modelB(value) => value,
                    };
                    value
                }

                /// Returns the held value as the mutable erased trait view.
                #[inline]
                fn value_mut(&mut self) -> &mut dyn __any_proto::ProtoView {
                    let value: &mut dyn __any_proto::ProtoView = match self {
                        Self::modelA(value) => value,
                        Self::modelB(value) => value,
                    };
                    value
                }
            }

            impl ::core::convert::From<ModelA> for AnyProto {
                fn from(value: ModelA) -> Self {
                    AnyProto::modelA(value)
                }
            }

            impl ::core::convert::From<ModelB> for AnyProto {
                fn from(value: ModelB) -> Self {
                    AnyProto::modelB(value)
                }
            }

            impl ::type_erasure::Erased for AnyProto {
                const TYPE_NAMES: &'static [&'static str] = &["ModelA", "ModelB"];

                #[inline]
                fn variant_index(&self) -> usize {
                    match self {
                        Self::modelA(_) => 0usize,
                        Self::modelB(_) => 1usize,
                    }
                }

                fn as_any(&self) -> &dyn ::core::any::Any {
                    let value: &dyn ::core::any::Any = match self {
                        Self::modelA(value) => value,
                        Self::modelB(value) => value,
                    };
                    value
                }

                fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                    let value: &mut dyn ::core::any::Any = match self {
                        Self::modelA(value) => value,
                        Self::modelB(value) => value,
                    };
                    value
                }
            }
        };
        assert_eq!(expanded.to_string(), expected.to_string());
    }

    #[test]
    fn deterministic() {
        let item = quote! {
            pub trait Proto: PartialEq {
                fn name(&self) -> String;
            }
        };
        let first = expand(quote!([ModelA, ModelB]), item.clone()).unwrap();
        let second = expand(quote!([ModelA, ModelB]), item).unwrap();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn capabilities_are_restated_in_order() {
        let erased = erased(
            parse_quote! {
                pub trait Proto: Send + PartialEq + 'static + Clone + Sync + core::fmt::Debug {
                    fn name(&self) -> String;
                }
            },
            quote!([ModelA, ModelB]),
        );

        assert_eq!(erased.variants.len(), 2);
        assert_eq!(erased.forwarders.len(), 1);

        // Derives and assertions are split into two groups, each in
        // declaration order.
        let (derive, assertion) = erased.capabilities();
        assert_eq!(
            derive.unwrap().to_string(),
            quote!(#[derive(PartialEq, Clone, core::fmt::Debug)]).to_string()
        );
        let expected = quote! {
            const _: fn() = || {
                fn assert_capabilities<T: ?::core::marker::Sized + Send + 'static + Sync>() {}
                assert_capabilities::<AnyProto>();
            };
        };
        assert_eq!(assertion.unwrap().to_string(), expected.to_string());
    }

    #[test]
    fn derives_gain_required_supertraits() {
        let cases = [
            (
                quote!(trait Proto: Eq {}),
                quote!(#[derive(::core::cmp::PartialEq, Eq)]),
            ),
            (
                quote!(trait Proto: Hash + Copy {}),
                quote!(#[derive(Hash, ::core::clone::Clone, Copy)]),
            ),
            (
                quote!(trait Proto: core::cmp::Ord + core::fmt::Debug {}),
                quote! {
                    #[derive(
                        ::core::cmp::PartialEq,
                        ::core::cmp::PartialOrd,
                        ::core::cmp::Eq,
                        core::cmp::Ord,
                        core::fmt::Debug
                    )]
                },
            ),
            (
                quote!(trait Proto: PartialOrd + Eq + PartialEq {}),
                quote!(#[derive(PartialOrd, Eq, PartialEq)]),
            ),
            (
                quote!(trait Proto: Eq + Ord {}),
                quote!(#[derive(::core::cmp::PartialEq, Eq, ::core::cmp::PartialOrd, Ord)]),
            ),
        ];

        for (item, expected) in cases {
            let erased = erased(syn::parse2(item).unwrap(), quote!([ModelA]));
            let (derive, assertion) = erased.capabilities();
            assert_eq!(derive.unwrap().to_string(), expected.to_string());
            assert!(assertion.is_none());
        }
    }

    #[test]
    fn no_capabilities_restates_none() {
        let erased = erased(parse_quote!(trait Proto {}), quote!([ModelA]));
        let (derive, assertion) = erased.capabilities();
        assert!(derive.is_none());
        assert!(assertion.is_none());
    }

    #[test]
    fn forwarders_follow_member_order() {
        let erased = erased(
            parse_quote! {
                trait Proto {
                    fn multiple(&self, first: bool, second: String) -> f64;
                    fn name(&self) -> String;
                }
            },
            quote!([ModelA, ModelB, ModelC]),
        );

        assert_eq!(erased.variants.len(), 3);
        let expected = [
            quote! {
                #[inline]
                fn multiple(&self, first: bool, second: String) -> f64 {
                    self.value().multiple(first, second)
                }
            },
            quote! {
                #[inline]
                fn name(&self) -> String {
                    self.value().name()
                }
            },
        ];
        assert_eq!(erased.forwarders.len(), expected.len());
        for (forwarder, expected) in erased.forwarders.iter().zip(expected) {
            assert_eq!(forwarder.to_token_stream().to_string(), expected.to_string());
        }
    }

    #[test]
    fn failures_emit_nothing() {
        let err = expand(quote!(ModelA), quote!(trait Proto {})).unwrap_err();
        assert!(err.to_string().contains("list the implementing types"));

        let err = expand(quote!([ModelA]), quote!(struct ModelA;)).unwrap_err();
        assert!(err.to_string().starts_with("`#[type_erasure]` is only usable on a trait"));

        let err = expand(quote!([ModelA, ModelA]), quote!(trait Proto {})).unwrap_err();
        assert!(err.to_string().contains("`modelA` more than once"));
    }
}
