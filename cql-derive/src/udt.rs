//! Derive macro implementation for `CqlUdt`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit};

pub fn derive_udt_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let type_name = parse_cql_attr(&input.attrs, "name")?.unwrap_or_else(|| name.to_string());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "CqlUdt only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "CqlUdt can only be derived for structs",
            ))
        }
    };

    let mut mappings = Vec::new();
    let mut to_fields = Vec::new();
    let mut from_fields = Vec::new();

    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        if has_skip_attr(&field.attrs)? {
            from_fields.push(quote! { #field_ident: ::core::default::Default::default() });
            continue;
        }

        // The property name is the Rust field name; the CQL field may differ.
        let property = field_ident.to_string();
        if let Some(cql_field) = parse_cql_attr(&field.attrs, "field")? {
            mappings.push(quote! { .map(#cql_field, #property) });
        }

        to_fields.push(quote! {
            .with_field(#property, ::cql_core::ToCqlValue::to_cql_value(&self.#field_ident))
        });
        from_fields.push(quote! {
            #field_ident: ::cql_core::FromCqlValue::from_cql_value(
                value.take(#property).unwrap_or(::cql_core::Value::Null),
            )
            .map_err(|e| ::cql_core::CqlError::InvalidType(
                ::std::format!("{}.{}: {}", #type_name, #property, e),
            ))?
        });
    }

    Ok(quote! {
        impl #impl_generics ::cql_core::UdtMapped for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn udt_map(definition: ::cql_core::UdtColumnInfo) -> ::cql_core::UdtMap {
                ::cql_core::UdtMap::new(#type_name, definition)
                    #(#mappings)*
            }

            fn to_udt_value(&self) -> ::cql_core::UdtValue {
                ::cql_core::UdtValue::new(#type_name)
                    #(#to_fields)*
            }

            #[allow(unused_mut, unused_variables)]
            fn from_udt_value(mut value: ::cql_core::UdtValue) -> ::cql_core::Result<Self> {
                Ok(Self {
                    #(#from_fields,)*
                })
            }
        }
    })
}

fn parse_cql_attr(attrs: &[syn::Attribute], key: &str) -> syn::Result<Option<String>> {
    let mut result = None;
    for attr in attrs {
        if !attr.path().is_ident("cql") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                let lit: Lit = meta.value()?.parse()?;
                match lit {
                    Lit::Str(s) => result = Some(s.value()),
                    other => return Err(syn::Error::new_spanned(other, "expected a string")),
                }
            } else if meta.input.peek(syn::Token![=]) {
                // Another key's value; consume it so parsing can continue.
                let _: Lit = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(result)
}

fn has_skip_attr(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut found = false;
    for attr in attrs {
        if !attr.path().is_ident("cql") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                found = true;
            } else if meta.input.peek(syn::Token![=]) {
                let _: Lit = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(found)
}
