use crate::attributes::{parse_field_options, parse_ignored};
use proc_macro::TokenStream;
use quote::quote;
use syn::{DataEnum, DataStruct, DeriveInput, Ident, Result, Type};

/// Structs are stored as documents. Fields listed in
/// `#[converter(ignored = "...")]` and fields carrying a `#[patch(...)]` flag
/// are not stored and come back as `Default::default()`.
pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let ignored_fields = parse_ignored(ast)?;

    let fields = match &data.fields {
        syn::Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let mut stored_idents: Vec<&Ident> = Vec::with_capacity(fields.len());
    let mut stored_names: Vec<String> = Vec::with_capacity(fields.len());
    let mut initializers: Vec<proc_macro2::TokenStream> = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_field_options(field)?;
        let ty: &Type = &field.ty;

        if ignored_fields.contains(&ident.to_string()) || !options.is_persistable() {
            initializers.push(quote! { #ident: Default::default() });
            continue;
        }

        let stored_name = options.stored_name(ident);
        initializers.push(quote! {
            #ident: patchdoc::common::from_value::<#ty>(&doc.get(#stored_name))?
        });
        stored_idents.push(ident);
        stored_names.push(stored_name);
    }

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let gen = quote! {
        impl #impl_generics patchdoc::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> patchdoc::errors::PatchResult<patchdoc::common::Value> {
                let mut doc = patchdoc::document::Document::new();
                #(doc.put(#stored_names, patchdoc::common::Convertible::to_value(&self.#stored_idents)?)?;)*
                Ok(patchdoc::common::Value::Document(doc))
            }

            fn from_value(value: &patchdoc::common::Value) -> patchdoc::errors::PatchResult<Self::Output> {
                match value {
                    patchdoc::common::Value::Document(doc) => {
                        Ok(#name {
                            #(#initializers,)*
                        })
                    },
                    _ => {
                        Err(patchdoc::errors::PatchError::new(
                            "Value is not a document",
                            patchdoc::errors::ErrorKind::ObjectMappingError,
                        ))
                    },
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}

/// Enums with unit variants only are stored as the variant name.
pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut variant_idents: Vec<&Ident> = Vec::with_capacity(data.variants.len());
    let mut variant_names: Vec<String> = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        if !matches!(variant.fields, syn::Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Only unit variants are supported",
            ));
        }
        variant_idents.push(&variant.ident);
        variant_names.push(variant.ident.to_string());
    }

    let type_name = name.to_string();

    let gen = quote! {
        impl #impl_generics patchdoc::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> patchdoc::errors::PatchResult<patchdoc::common::Value> {
                match self {
                    #(#name::#variant_idents => Ok(patchdoc::common::Value::from(#variant_names)),)*
                }
            }

            fn from_value(value: &patchdoc::common::Value) -> patchdoc::errors::PatchResult<Self::Output> {
                match value.as_string().map(|s| s.as_str()) {
                    #(Some(#variant_names) => Ok(#name::#variant_idents),)*
                    _ => {
                        Err(patchdoc::errors::PatchError::new(
                            &format!("Value is not a variant of {}", #type_name),
                            patchdoc::errors::ErrorKind::ObjectMappingError,
                        ))
                    },
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}
