use crate::attributes::parse_field_options;
use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, LitStr, Result};

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut entity_name = name.to_string();
    let mut id_field: Option<String> = None;

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("Entity name cannot be empty"));
                    }
                    entity_name = s.value();
                    Ok(())
                } else if meta.path.is_ident("id") {
                    if id_field.is_some() {
                        return Err(meta.error("Multiple id attributes are not allowed"));
                    }
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    id_field = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity attribute, expected name or id"))
                }
            })?;
        }
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

    let id_field_name = id_field.unwrap_or_else(|| "id".to_string());
    let Some((field, id_ident)) = fields.iter().find_map(|field| {
        field
            .ident
            .as_ref()
            .filter(|ident| *ident == id_field_name.as_str())
            .map(|ident| (field, ident))
    }) else {
        return Err(syn::Error::new_spanned(
            ast,
            format!(
                "Field {} not found in struct; name the id field with #[entity(id = \"...\")]",
                id_field_name
            ),
        ));
    };

    let options = parse_field_options(field)?;
    if !options.is_persistable() {
        return Err(syn::Error::new_spanned(
            field,
            "The id field cannot be transient, derived or class-level",
        ));
    }
    let id_attribute = options.stored_name(id_ident);

    let gen = quote! {
        impl #impl_generics patchdoc::repository::Entity for #name #ty_generics #where_clause {
            fn entity_name() -> String {
                #entity_name.to_string()
            }

            fn id_attribute() -> &'static str {
                #id_attribute
            }

            fn id_value(&self) -> patchdoc::errors::PatchResult<patchdoc::common::Value> {
                patchdoc::common::Convertible::to_value(&self.#id_ident)
            }
        }
    };

    Ok(TokenStream::from(gen))
}
