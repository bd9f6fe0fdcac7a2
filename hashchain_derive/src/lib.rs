//! Derive macros for the hashchain crate.
//!
//! Provides `#[derive(Error)]`, a small in-tree replacement for `thiserror`.

mod error;

use proc_macro::TokenStream;

/// Implements `Display`, `std::error::Error` and, for `#[from]` fields, `From`.
#[proc_macro_derive(Error, attributes(error, from, source))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
