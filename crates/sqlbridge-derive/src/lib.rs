//! Derive macros for sqlbridge
//!
//! Provides `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_row;

/// Derive `FromRow` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use sqlbridge::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     name: String,
///     #[sqlbridge(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[sqlbridge(column = "name")]` - Map field to a different column name
///
/// Every field type must implement `sqlbridge::FromValue`.
#[proc_macro_derive(FromRow, attributes(sqlbridge))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
