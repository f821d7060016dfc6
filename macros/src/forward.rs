use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Ident, Path, Visibility};

use crate::{
    accessor::Accessor,
    model::{Interface, Member},
};

/// An inherent method of the erased enum that delegates to the same-named
/// member of the accessor's view.
pub struct Forwarder {
    vis: Visibility,
    member: Member,
    call: TokenStream,
}

impl Forwarder {
    fn body(&self) -> TokenStream {
        let Forwarder { member, call, .. } = self;
        let name = &member.name;
        let body = if member.is_property() {
            quote!(#call.#name())
        } else {
            let labels = member.labels();
            quote!(#call.#name(#(#labels),*))
        };
        guard_unsafe(member, body)
    }
}

impl ToTokens for Forwarder {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Forwarder { vis, member, .. } = self;
        let attrs = &member.attrs;
        let signature = member.signature();
        let lint = member.unsafety.map(|_| quote!(#[allow(unused_unsafe)]));
        let body = self.body();

        tokens.extend(quote! {
            #(#attrs)*
            #lint
            #[inline]
            #vis #signature {
                #body
            }
        });
    }
}

fn guard_unsafe(member: &Member, body: TokenStream) -> TokenStream {
    match member.unsafety {
        Some(unsafety) => quote!(#unsafety { #body }),
        None => body,
    }
}

/// Builds one forwarder per trait member, in declaration order.
pub fn forwarders(vis: &Visibility, members: &[Member], accessor: &Accessor) -> Vec<Forwarder> {
    members
        .iter()
        .map(|member| Forwarder {
            vis: vis.clone(),
            member: member.clone(),
            call: accessor.call(member.is_mut()),
        })
        .collect()
}

/// The object-safe trait the accessor returns.
///
/// A trait with a supertrait such as `PartialEq` cannot be used as a trait
/// object, so the erased enum views its payload through a trait re-declaring
/// only the members. The view lives in its own module so that its blanket
/// impl never makes method calls on the payload types ambiguous.
pub struct View {
    vis: Visibility,
    module: Ident,
    name: Ident,
    interface: Ident,
    members: Vec<Member>,
}

impl View {
    pub fn new(interface: &Interface, module: Ident) -> Self {
        View {
            vis: interface.vis.clone(),
            module,
            name: format_ident!("{}View", interface.name),
            interface: interface.name.clone(),
            members: interface.members.clone(),
        }
    }

    /// `__any_proto::ProtoView`
    pub fn path(&self) -> Path {
        let View { module, name, .. } = self;
        syn::parse_quote!(#module::#name)
    }
}

impl ToTokens for View {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let View {
            vis,
            module,
            name,
            interface,
            members,
        } = self;

        let declarations = members.iter().map(|member| {
            let attrs = &member.attrs;
            let signature = member.signature();
            quote! {
                #(#attrs)*
                #signature;
            }
        });

        let impls = members.iter().map(|member| {
            let attrs = &member.attrs;
            let signature = member.signature();
            let lint = member.unsafety.map(|_| quote!(#[allow(unused_unsafe)]));
            let member_name = &member.name;
            let labels = member.labels();
            let body = guard_unsafe(
                member,
                quote!(<T as super::#interface>::#member_name(self #(, #labels)*)),
            );
            quote! {
                #(#attrs)*
                #lint
                #[inline]
                #signature {
                    #body
                }
            }
        });

        let doc = format!(" The members of [`{interface}`] seen through an erased value.");
        tokens.extend(quote! {
            #[doc(hidden)]
            #vis mod #module {
                #[allow(unused_imports)]
                use super::*;

                #[doc = #doc]
                pub trait #name {
                    #(#declarations)*
                }

                impl<T: super::#interface> #name for T {
                    #(#impls)*
                }
            }
        });
    }
}
