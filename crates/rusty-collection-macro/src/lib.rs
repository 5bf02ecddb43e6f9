// Rusty Collection procedural macros

use proc_macro::TokenStream;

use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod expand;

/// Derive macro for record schemas
///
/// Generates a `Record` implementation whose schema is built once, on first
/// use, from the struct's fields, their Rust types and their attributes.
///
/// # Example
///
/// ```ignore
/// use rusty_collection::{Collection, Record};
///
/// #[derive(Collection)]
/// #[collection(name = "Payment", rules = payment_rules, extra(label = payment_label))]
/// struct Payment {
///     id: Option<i64>,
///
///     #[rule(positiveInt)]
///     #[rule(range(1, 10_000), on("checkout"))]
///     amount: i64,
///
///     /// @rule length 3 32
///     reference: String,
///
///     #[field(hidden)]
///     token: Option<String>,
///
///     #[field(record)]
///     customer: Option<Customer>,
///
///     #[field(computed, get = display_amount)]
///     display: String,
/// }
/// ```
///
/// # Type reflection
///
/// - `Option<T>` → nullable field of `T`'s type
/// - integers → `int`, `f32`/`f64` → `float`, `String`/`&str` → `string`, `bool` → `bool`
/// - `Vec`, `VecDeque`, `HashSet`, `BTreeSet` → `array`
/// - `HashMap`, `BTreeMap`, `IndexMap` → `object`
/// - `#[field(record)]` → nested record of `T: Record`
/// - anything else → `any`
///
/// # Attributes
///
/// **Type level** `#[collection(...)]`:
/// - `name = "X"` - Schema name (defaults to the struct name)
/// - `rules = path` - `fn() -> RuleTable` with explicit table rules
/// - `extra(name = path)` - `fn(&Collection) -> Value` extra-field resolver
///
/// **Field level** `#[field(...)]`:
/// - `hidden` - Excluded from projection unless requested as an extra field
/// - `nullable` - Nullable without `Option<T>`
/// - `record` - Nested record type
/// - `computed` - Virtual field, with `get = path` and/or `set = path`
/// - `rename = "x"` - Field name used by the collection
/// - `default = literal` - Initial value
///
/// **Rules** `#[rule(...)]`:
/// - `name` or `name(literal, ...)` - Registered rule with parameters
/// - `on("a", "b")` - Restrict the attribute's rules to scenarios
/// - `"range 10 20"` - Annotation text
///
/// Doc comment lines starting with `@rule` are read as annotation text.
#[proc_macro_derive(Collection, attributes(collection, field, rule))]
pub fn derive_collection(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::impl_collection(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
