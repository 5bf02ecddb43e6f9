// File: rusty-collection-macro/src/expand.rs
// Purpose: Code generation for #[derive(Collection)]

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Field, Fields, GenericArgument, PathArguments, Type};

use crate::attrs::{collection_attrs, field_attrs, rule_calls};

pub fn impl_collection(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Collection cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Collection only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(ident, "Collection only supports structs")),
    };

    let attrs = collection_attrs(&input.attrs)?;
    let record_name = attrs.name.unwrap_or_else(|| ident.to_string());

    let field_defs = fields.iter().map(field_def).collect::<syn::Result<Vec<_>>>()?;

    let extras: Vec<_> = attrs
        .extras
        .iter()
        .map(|(name, resolver)| quote! { .extra(#name, #resolver) })
        .collect();

    let rules = attrs.rules.map(|table| quote! { .rules(#table()) });

    Ok(quote! {
        impl ::rusty_collection::Record for #ident {
            fn schema() -> ::std::sync::Arc<::rusty_collection::Schema> {
                static SCHEMA: ::rusty_collection::__private::Lazy<::std::sync::Arc<::rusty_collection::Schema>> =
                    ::rusty_collection::__private::Lazy::new(|| {
                        ::rusty_collection::Schema::builder(#record_name)
                            #( .field(#field_defs) )*
                            #( #extras )*
                            #rules
                            .build()
                    });
                ::std::sync::Arc::clone(&SCHEMA)
            }
        }
    })
}

fn field_def(field: &Field) -> syn::Result<TokenStream> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let attrs = field_attrs(&field.attrs)?;
    let name = attrs.rename.clone().unwrap_or_else(|| ident.unraw().to_string());

    let (inner, optional) = unwrap_option(&field.ty);
    let ty = field_type(inner, attrs.record);

    if !attrs.computed && (attrs.get.is_some() || attrs.set.is_some()) {
        return Err(syn::Error::new_spanned(
            ident,
            "`get`/`set` require #[field(computed)]",
        ));
    }

    let mut def = if attrs.computed {
        quote! { ::rusty_collection::FieldDef::virtual_field(#name, #ty) }
    } else {
        quote! { ::rusty_collection::FieldDef::new(#name, #ty) }
    };

    if optional || attrs.nullable {
        def = quote! { #def.nullable() };
    }
    if attrs.hidden {
        def = quote! { #def.hidden() };
    }
    if let Some(value) = &attrs.default {
        def = quote! { #def.default_value(#value) };
    }
    if let Some(getter) = &attrs.get {
        def = quote! { #def.get(#getter) };
    }
    if let Some(setter) = &attrs.set {
        def = quote! { #def.set(#setter) };
    }
    for call in rule_calls(&field.attrs)? {
        def = quote! { #def #call };
    }

    Ok(def)
}

/// `Option<T>` -> (`T`, true)
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return (inner, true);
                    }
                }
            }
        }
    }
    (ty, false)
}

/// Map a Rust type to its declared field type
fn field_type(ty: &Type, record: bool) -> TokenStream {
    if record {
        return quote! {
            ::rusty_collection::FieldType::Record(<#ty as ::rusty_collection::Record>::schema())
        };
    }

    let ident = match ty {
        Type::Reference(reference) => return field_type(&reference.elem, false),
        Type::Path(type_path) => type_path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    };

    match ident.as_deref() {
        Some(
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128"
            | "usize",
        ) => quote! { ::rusty_collection::FieldType::Int },
        Some("f32" | "f64") => quote! { ::rusty_collection::FieldType::Float },
        Some("String" | "str") => quote! { ::rusty_collection::FieldType::String },
        Some("bool") => quote! { ::rusty_collection::FieldType::Bool },
        Some("Vec" | "VecDeque" | "HashSet" | "BTreeSet") => {
            quote! { ::rusty_collection::FieldType::Array }
        }
        Some("HashMap" | "BTreeMap" | "IndexMap") => quote! { ::rusty_collection::FieldType::Object },
        _ => quote! { ::rusty_collection::FieldType::Any },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(source: &str) -> String {
        let input: DeriveInput = syn::parse_str(source).unwrap();
        impl_collection(&input).unwrap().to_string()
    }

    #[test]
    fn test_reflects_types_and_nullability() {
        let out = expand(
            "struct Payment { id: Option<i64>, amount: i32, note: String, tags: Vec<String> }",
        );
        assert!(out.contains("FieldDef :: new (\"id\" , :: rusty_collection :: FieldType :: Int) . nullable ()"));
        assert!(out.contains("FieldDef :: new (\"amount\" , :: rusty_collection :: FieldType :: Int)"));
        assert!(out.contains("FieldType :: String"));
        assert!(out.contains("FieldType :: Array"));
        assert!(out.contains("builder (\"Payment\")"));
    }

    #[test]
    fn test_rules_and_annotations() {
        let out = expand(
            r#"
            struct Product {
                #[rule(required, range(10, -20), on("strict"))]
                #[rule("length 3 12")]
                /// @rule startsWith "p"
                sku: String,
            }
            "#,
        );
        assert!(out.contains("RuleSpec :: with_params (\"required\""));
        assert!(out.contains("Value :: Int (10i64)"));
        assert!(out.contains("with_params (\"range\""));
        assert!(out.contains(". on ([\"strict\"])"));
        assert!(out.contains(". annotation (\"length 3 12\")"));
        assert!(out.contains(". annotation (\"startsWith \\\"p\\\"\")"));
    }

    #[test]
    fn test_rejects_non_literal_params() {
        let input: DeriveInput =
            syn::parse_str("struct Bad { #[rule(range(LOW, 2))] n: i32 }").unwrap();
        assert!(impl_collection(&input).is_err());
    }

    #[test]
    fn test_rejects_tuple_structs() {
        let input: DeriveInput = syn::parse_str("struct Bad(i32);").unwrap();
        assert!(impl_collection(&input).is_err());
    }
}
