use crate::attributes::{parse_field_options, parse_ignored};
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DataStruct, DeriveInput, Ident, Result};

pub(crate) fn generate_patchable_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;

    // the table lives in a `static`, which cannot depend on generic parameters
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "Patchable cannot be derived for generic structs; build an AttributeTable by hand instead",
        ));
    }

    let fields = match &data.fields {
        syn::Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let ignored_fields = parse_ignored(ast)?;

    let mut seen: Vec<String> = Vec::with_capacity(fields.len());
    let mut descriptors = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let mut options = parse_field_options(field)?;
        // never stored by the document mapping, so never part of a payload
        let transient = Ident::new("TRANSIENT", Span::call_site());
        if ignored_fields.contains(&ident.to_string()) && !options.flags.contains(&transient) {
            options.flags.push(transient);
        }
        let stored_name = options.stored_name(ident);

        if seen.contains(&stored_name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("Duplicate attribute name '{}'", stored_name),
            ));
        }
        seen.push(stored_name.clone());

        let flags = &options.flags;
        descriptors.push(quote! {
            patchdoc::update::AttributeDescriptor::new(
                #stored_name,
                patchdoc::update::AttributeFlags::NONE
                    #(.union(patchdoc::update::AttributeFlags::#flags))*,
                |record: &#name| patchdoc::common::Convertible::to_value(&record.#ident),
            )
        });
    }

    let shape = name.to_string();

    let gen = quote! {
        impl patchdoc::update::Patchable for #name {
            fn attribute_table() -> &'static patchdoc::update::AttributeTable<Self> {
                static TABLE: std::sync::LazyLock<patchdoc::update::AttributeTable<#name>> =
                    std::sync::LazyLock::new(|| {
                        patchdoc::update::AttributeTable::from_validated(
                            #shape,
                            vec![#(#descriptors),*],
                        )
                    });
                &TABLE
            }
        }
    };

    Ok(TokenStream::from(gen))
}
