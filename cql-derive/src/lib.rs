//! Derive macros mapping Rust structs to CQL user-defined types.
//!
//! # Example
//!
//! ```ignore
//! use cql_derive::CqlUdt;
//!
//! #[derive(CqlUdt)]
//! #[cql(name = "Address")]
//! struct Address {
//!     #[cql(field = "street_name")]
//!     street: String,
//!     zip: Option<i32>,
//!     #[cql(skip)]
//!     cached_label: String,
//! }
//! ```

extern crate proc_macro;

mod udt;

use proc_macro::TokenStream;

/// Derives `cql_core::UdtMapped` for a struct.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[cql(name = "...")]`: the native type name carried in
///   `UdtValue::type_name` (defaults to the Rust struct name).
///
/// ## Field-level
/// - `#[cql(field = "...")]`: the CQL field stored in this property
///   (defaults to the Rust field name).
/// - `#[cql(skip)]`: not mapped; filled with `Default::default()` on read.
///
/// # Supported Field Types
///
/// Every type implementing `cql_core::ToCqlValue` and
/// `cql_core::FromCqlValue`: the scalar types, `Option<T>` for nullable
/// fields, `Vec<T>` for lists and sets, and `cql_core::Value` itself.
#[proc_macro_derive(CqlUdt, attributes(cql))]
pub fn derive_udt(input: TokenStream) -> TokenStream {
    udt::derive_udt_impl(input)
}
