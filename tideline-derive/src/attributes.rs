//! Attribute parsing utilities

use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, ExprLit, Field, Fields, Lit, Meta, Token, Visibility};

/// How a field takes part in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Column,
    /// `#[record(embed)]`: fields promoted into the outer record.
    Embed,
    /// `#[record(nested)]`: a joined sub-record.
    Nested,
}

/// Everything the derives need to know about one field.
pub struct FieldAttributes<'a> {
    pub field: &'a Field,
    pub ident: &'a syn::Ident,
    /// Comma-joined `#[tideline(...)]` tokens.
    pub directive_tag: String,
    /// Raw `#[db = "..."]` value.
    pub db_tag: String,
    pub role: FieldRole,
    pub visible: bool,
}

impl FieldAttributes<'_> {
    pub fn has_directive(&self, token: &str) -> bool {
        self.directive_tag.split(',').any(|t| t.trim() == token)
    }
}

/// Named fields of a non-generic struct.
pub fn struct_fields<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<Vec<FieldAttributes<'a>>> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            format!("{derive} cannot be derived for generic structs"),
        ));
    }

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                format!("{derive} can only be derived for structs with named fields"),
            ));
        }
    };

    fields.iter().map(field_attributes).collect()
}

fn field_attributes(field: &Field) -> syn::Result<FieldAttributes<'_>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;

    let mut directives = Vec::new();
    let mut db_tag = String::new();
    let mut role = FieldRole::Column;

    for attr in &field.attrs {
        if attr.path().is_ident("tideline") {
            directives.extend(directive_tokens(attr)?);
        } else if attr.path().is_ident("db") {
            db_tag = string_value(attr)?;
        } else if attr.path().is_ident("record") {
            role = record_role(attr)?;
        }
    }

    if role == FieldRole::Embed && !db_tag.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "an embedded record has no column of its own; remove #[db]",
        ));
    }

    Ok(FieldAttributes {
        field,
        ident,
        directive_tag: directives.join(","),
        db_tag,
        role,
        visible: !matches!(field.vis, Visibility::Inherited),
    })
}

/// `#[tideline(a, b)]` or `#[tideline = "a,b"]`.
fn directive_tokens(attr: &Attribute) -> syn::Result<Vec<String>> {
    match &attr.meta {
        Meta::List(_) => {
            let idents = attr.parse_args_with(Punctuated::<syn::Ident, Token![,]>::parse_terminated)?;
            Ok(idents.iter().map(ToString::to_string).collect())
        }
        Meta::NameValue(_) => Ok(vec![string_value(attr)?]),
        Meta::Path(_) => Ok(Vec::new()),
    }
}

/// Extract the string from `#[name = "..."]`
fn string_value(attr: &Attribute) -> syn::Result<String> {
    let meta = attr.meta.require_name_value()?;
    if let syn::Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) = &meta.value {
        Ok(s.value())
    } else {
        Err(syn::Error::new_spanned(&meta.value, "expected a string literal"))
    }
}

fn record_role(attr: &Attribute) -> syn::Result<FieldRole> {
    let ident: syn::Ident = attr.parse_args()?;
    match ident.to_string().as_str() {
        "embed" => Ok(FieldRole::Embed),
        "nested" => Ok(FieldRole::Nested),
        other => Err(syn::Error::new_spanned(
            &ident,
            format!("unknown record attribute `{other}`, expected `embed` or `nested`"),
        )),
    }
}
