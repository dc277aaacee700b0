use proc_macro2::{Ident, Span};
use syn::{DeriveInput, Field, LitStr, Result};

/// Options read from the `#[patch(...)]` attributes of one field.
pub(crate) struct FieldOptions {
    pub(crate) flags: Vec<Ident>,
    pub(crate) rename: Option<String>,
}

impl FieldOptions {
    /// Stored attribute name: the rename if given, else the field name.
    pub(crate) fn stored_name(&self, ident: &Ident) -> String {
        self.rename.clone().unwrap_or_else(|| ident.to_string())
    }

    pub(crate) fn is_persistable(&self) -> bool {
        self.flags.is_empty()
    }
}

pub(crate) fn parse_field_options(field: &Field) -> Result<FieldOptions> {
    let mut flags: Vec<Ident> = Vec::new();
    let mut rename: Option<String> = None;

    for attr in &field.attrs {
        if attr.path().is_ident("patch") {
            attr.parse_nested_meta(|meta| {
                let flag = if meta.path.is_ident("transient") {
                    "TRANSIENT"
                } else if meta.path.is_ident("derived") {
                    "DERIVED"
                } else if meta.path.is_ident("class_level") {
                    "CLASS_LEVEL"
                } else if meta.path.is_ident("rename") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("rename cannot be empty"));
                    }
                    rename = Some(s.value());
                    return Ok(());
                } else {
                    return Err(meta.error(
                        "Unknown patch attribute, expected transient, derived, class_level or rename",
                    ));
                };

                let flag = Ident::new(flag, Span::call_site());
                if !flags.contains(&flag) {
                    flags.push(flag);
                }
                Ok(())
            })?;
        }
    }

    Ok(FieldOptions { flags, rename })
}

/// Field names listed in the struct-level `#[converter(ignored = "...")]`.
/// These fields are never stored.
pub(crate) fn parse_ignored(ast: &DeriveInput) -> Result<Vec<String>> {
    let mut ignored_fields: Vec<String> = vec![];

    for attr in &ast.attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignored") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    ignored_fields.extend(split_list(&s.value()));
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute, expected ignored"))
                }
            })?;
        }
    }
    Ok(ignored_fields)
}

/// Splits a comma separated attribute list such as `"a, b"`.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
