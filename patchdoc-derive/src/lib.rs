#![recursion_limit = "128"]
//! # patchdoc Derive Macros
//!
//! Procedural macros implementing the patchdoc traits.
//!
//! ## Macros
//!
//! ### `Patchable`
//!
//! Builds the attribute descriptor table of a struct at compile time. Every
//! named field becomes an attribute, in declaration order, read through its
//! `Convertible` implementation.
//!
//! - **Supported for**: non-generic structs with named fields
//! - **Field attribute**: `#[patch(transient)]`, `#[patch(derived)]`,
//!   `#[patch(class_level)]`, `#[patch(rename = "...")]`
//! - **Struct attribute**: `#[converter(ignored = "a, b")]` marks the listed
//!   fields transient
//!
//! ### `Convertible`
//!
//! Converts a struct to and from a document, or a unit-only enum to and from
//! its variant name.
//!
//! - **Struct attribute**: `#[converter(ignored = "a, b")]`
//! - Fields flagged with `#[patch(...)]` are not stored either
//!
//! ### `Entity`
//!
//! Marks a struct as stored in its own collection.
//!
//! - **Struct attribute**: `#[entity(name = "...", id = "...")]`
//!
//! # Examples
//!
//! ```rust,ignore
//! use patchdoc_derive::{Convertible, Entity, Patchable};
//!
//! #[derive(Default, Patchable, Convertible, Entity)]
//! #[entity(name = "users", id = "id")]
//! pub struct User {
//!     #[patch(rename = "_id")]
//!     pub id: Option<String>,
//!     pub name: Option<String>,
//!     pub age: Option<i32>,
//!     #[patch(transient)]
//!     pub internal_cache: Option<String>,
//! }
//! ```

extern crate proc_macro;
mod attributes;
mod convertible;
mod entity;
mod patchable;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::entity::generate_entity_for_struct;
use crate::patchable::generate_patchable_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

#[proc_macro_derive(Patchable, attributes(patch, converter))]
pub fn derive_patchable(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_patchable_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Patchable for enums. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Patchable for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}

#[proc_macro_derive(Convertible, attributes(converter, patch))]
pub fn derive_convert(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_convertible_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!(
                        "Failed to derive Convertible for struct '{}': {}.\n\
                         Make sure all fields implement Convertible trait.",
                        ast.ident, e
                    ),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(ref data) => match generate_convertible_for_enum(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!("Failed to derive Convertible for enum '{}': {}", ast.ident, e),
                );
                error.to_compile_error().into()
            }
        },
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Convertible for unions. Unions are not supported by the Convertible derive macro.",
            );
            error.to_compile_error().into()
        }
    }
}

#[proc_macro_derive(Entity, attributes(entity, patch))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!(
                        "Failed to derive Entity for struct '{}': {}.\n\
                         Example: #[derive(Entity)] #[entity(name = \"users\", id = \"id\")] pub struct User {{ id: Option<String> }}",
                        ast.ident, e
                    ),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Entity for enums. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Entity for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
