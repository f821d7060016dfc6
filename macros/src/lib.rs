use proc_macro::TokenStream;
use quote::quote;

mod accessor;
mod error;
mod expand;
mod forward;
mod model;
mod validate;
mod variant;

/// Generates a closed, type-erased `Any<Trait>` enum next to a trait.
///
/// See the `type-erasure` crate for documentation.
#[proc_macro_attribute]
pub fn type_erasure(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = proc_macro2::TokenStream::from(input);
    match expand::expand(args.into(), item.clone()) {
        Ok(expanded) => expanded.into(),
        Err(err) => {
            let err = err.to_compile_error();
            quote!(#item #err).into()
        }
    }
}
