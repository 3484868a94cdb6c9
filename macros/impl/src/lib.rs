//! Procedural macro implementations re-exported by `bincraft-macros`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, AttributeArgs, ItemFn, Lit, Meta, NestedMeta};

/// Run a test function with a `tracing` subscriber that writes to the test output.
///
/// The default level is `DEBUG`. Pass a level as `#[test_traced("INFO")]` or
/// `#[test_traced(level = "INFO")]` to change it.
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let input = parse_macro_input!(item as ItemFn);

    let mut level = String::from("DEBUG");
    for arg in args {
        match arg {
            NestedMeta::Lit(Lit::Str(lit)) => level = lit.value(),
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("level") => {
                if let Lit::Str(lit) = nv.lit {
                    level = lit.value();
                } else {
                    return syn::Error::new_spanned(nv.lit, "level must be a string literal")
                        .to_compile_error()
                        .into();
                }
            }
            other => {
                return syn::Error::new_spanned(other, "expected a level such as \"INFO\"")
                    .to_compile_error()
                    .into();
            }
        }
    }

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis #sig {
            let level: ::bincraft_macros::tracing::Level = #level
                .parse()
                .expect("invalid tracing level");
            let subscriber = ::bincraft_macros::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(level)
                .with_line_number(true)
                .finish();
            let dispatch = ::bincraft_macros::tracing::Dispatch::new(subscriber);
            ::bincraft_macros::tracing::dispatcher::with_default(&dispatch, || #block)
        }
    };
    TokenStream::from(expanded)
}
