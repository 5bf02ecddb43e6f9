// File: rusty-collection-macro/src/attrs.rs
// Purpose: Parsing of #[collection], #[field], #[rule] and `@rule` doc lines

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Ident, Lit, LitStr, Meta, Path, Token, UnOp};

/// Type-level options: `#[collection(name = "...", rules = path, extra(label = path))]`
#[derive(Default)]
pub struct CollectionAttrs {
    pub name: Option<String>,
    pub rules: Option<Path>,
    pub extras: Vec<(String, Path)>,
}

pub fn collection_attrs(attrs: &[Attribute]) -> syn::Result<CollectionAttrs> {
    let mut out = CollectionAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("collection")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                out.name = Some(lit.value());
            } else if meta.path.is_ident("rules") {
                out.rules = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("extra") {
                meta.parse_nested_meta(|extra| {
                    let name = extra
                        .path
                        .get_ident()
                        .ok_or_else(|| extra.error("expected an extra field name"))?
                        .unraw()
                        .to_string();
                    let resolver: Path = extra.value()?.parse()?;
                    out.extras.push((name, resolver));
                    Ok(())
                })?;
            } else {
                return Err(meta.error("unsupported collection attribute"));
            }
            Ok(())
        })?;
    }

    Ok(out)
}

/// Field options: `#[field(hidden, nullable, record, computed, rename = "x",
/// default = 0, get = path, set = path)]`
#[derive(Default)]
pub struct FieldAttrs {
    pub hidden: bool,
    pub nullable: bool,
    pub record: bool,
    pub computed: bool,
    pub rename: Option<String>,
    pub default: Option<TokenStream>,
    pub get: Option<Path>,
    pub set: Option<Path>,
}

pub fn field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("field")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("hidden") {
                out.hidden = true;
            } else if meta.path.is_ident("nullable") {
                out.nullable = true;
            } else if meta.path.is_ident("record") {
                out.record = true;
            } else if meta.path.is_ident("computed") {
                out.computed = true;
            } else if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit.value());
            } else if meta.path.is_ident("default") {
                let expr: Expr = meta.value()?.parse()?;
                out.default = Some(value_tokens(&expr)?);
            } else if meta.path.is_ident("get") {
                out.get = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("set") {
                out.set = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unsupported field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(out)
}

/// One entry of `#[rule(...)]`
enum RuleItem {
    /// `"range 10 20"`
    Annotation(LitStr),
    /// `required`, `range(10, 20)`, `on("a", "b")`
    Call { name: Ident, params: Vec<Expr> },
}

impl Parse for RuleItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(RuleItem::Annotation(input.parse()?));
        }

        // Rule names may be keywords, e.g. `in("a", "b")`
        let name = Ident::parse_any(input)?;
        let params = if input.peek(syn::token::Paren) {
            let content;
            syn::parenthesized!(content in input);
            Punctuated::<Expr, Token![,]>::parse_terminated(&content)?
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        Ok(RuleItem::Call { name, params })
    }
}

/// Builder calls for every rule declared on a field, in declaration order
pub fn rule_calls(attrs: &[Attribute]) -> syn::Result<Vec<TokenStream>> {
    let mut calls = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let Some(text) = doc_rule(attr) {
                calls.push(quote! { .annotation(#text) });
            }
            continue;
        }
        if !attr.path().is_ident("rule") {
            continue;
        }

        let items = attr.parse_args_with(Punctuated::<RuleItem, Token![,]>::parse_terminated)?;

        let mut scenarios = Vec::new();
        let mut rules = Vec::new();
        let mut annotations = Vec::new();
        for item in items {
            match item {
                RuleItem::Call { name, params } if name == "on" => {
                    for param in params {
                        match param {
                            Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => scenarios.push(s),
                            other => {
                                return Err(syn::Error::new_spanned(other, "scenario names must be string literals"))
                            }
                        }
                    }
                }
                RuleItem::Call { name, params } => {
                    let params = params.iter().map(value_tokens).collect::<syn::Result<Vec<_>>>()?;
                    rules.push((name.unraw().to_string(), params));
                }
                RuleItem::Annotation(text) => annotations.push(text),
            }
        }

        if !scenarios.is_empty() && !annotations.is_empty() {
            return Err(syn::Error::new_spanned(
                attr,
                "`on(...)` cannot scope string annotations; use `name(params)` syntax",
            ));
        }

        for text in annotations {
            calls.push(quote! { .annotation(#text) });
        }
        for (name, params) in rules {
            let scoped = if scenarios.is_empty() {
                quote! {}
            } else {
                quote! { .on([#(#scenarios),*]) }
            };
            calls.push(quote! {
                .rule_spec(
                    ::rusty_collection::RuleSpec::with_params(#name, ::std::vec![#(#params),*])
                    #scoped
                )
            });
        }
    }

    Ok(calls)
}

/// `/// @rule range 10 20` -> `range 10 20`
fn doc_rule(attr: &Attribute) -> Option<String> {
    let Meta::NameValue(nv) = &attr.meta else {
        return None;
    };
    let Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) = &nv.value else {
        return None;
    };
    let value = s.value();
    let rest = value.trim().strip_prefix("@rule")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim().to_string())
}

/// Literal expression -> `::rusty_collection::Value` constructor tokens
pub fn value_tokens(expr: &Expr) -> syn::Result<TokenStream> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => lit_tokens(lit, false),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match &**inner {
            Expr::Lit(ExprLit { lit, .. }) => lit_tokens(lit, true),
            other => Err(syn::Error::new_spanned(other, "rule parameters must be literals")),
        },
        Expr::Group(group) => value_tokens(&group.expr),
        Expr::Paren(paren) => value_tokens(&paren.expr),
        other => Err(syn::Error::new_spanned(other, "rule parameters must be literals")),
    }
}

fn lit_tokens(lit: &Lit, negative: bool) -> syn::Result<TokenStream> {
    match lit {
        Lit::Int(i) => {
            let n: i64 = i.base10_parse()?;
            let n = if negative { -n } else { n };
            Ok(quote! { ::rusty_collection::Value::Int(#n) })
        }
        Lit::Float(f) => {
            let n: f64 = f.base10_parse()?;
            let n = if negative { -n } else { n };
            Ok(quote! { ::rusty_collection::Value::Float(#n) })
        }
        Lit::Str(s) if !negative => Ok(quote! { ::rusty_collection::Value::String(::std::string::String::from(#s)) }),
        Lit::Bool(b) if !negative => {
            let b = b.value;
            Ok(quote! { ::rusty_collection::Value::Bool(#b) })
        }
        other => Err(syn::Error::new_spanned(other, "unsupported literal in rule parameters")),
    }
}
