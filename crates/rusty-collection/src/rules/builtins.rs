// File: src/rules/builtins.rs
// Purpose: Built-in rules wrapping the core predicate functions

use once_cell::sync::Lazy;
use regex::Regex;
use rusty_collection_validation as predicates;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::registry::{RuleRegistry, RuleViolation};
use crate::config::ValidationConfig;
use crate::schema::FieldType;
use crate::value::Value;

type RuleResult = Result<(), RuleViolation>;

// Compiled `regex` rule patterns, keyed by source
static REGEX_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) fn install(registry: &mut RuleRegistry, config: &ValidationConfig) {
    registry.register("required", required);
    registry.register("filled", filled);
    registry.register("positiveInt", positive_int);
    registry.register("int", int);
    registry.register("numeric", numeric);
    registry.register("range", range);
    registry.register("min", min);
    registry.register("max", max);
    registry.register("length", length);
    registry.register("minLength", min_length);
    registry.register("maxLength", max_length);
    registry.register("email", email);
    registry.register("url", url);
    registry.register("regex", pattern);
    registry.register("in", one_of);
    registry.register("notIn", not_one_of);
    registry.register("startsWith", starts_with);
    registry.register("endsWith", ends_with);
    registry.register("contains", contains);
    registry.register("minItems", min_items);
    registry.register("maxItems", max_items);
    registry.register("unique", unique);
    registry.register("password", password);
    registry.register("type", type_match);

    let public = config.public_domains.clone();
    registry.register("noPublicDomain", move |value, _| no_public_domain(value, &public));

    let blocked = config.blocked_domains.clone();
    registry.register("blockedDomains", move |value, params| {
        blocked_domains(value, params, &blocked)
    });
}

fn fail(message: impl Into<String>) -> RuleResult {
    Err(RuleViolation::new(message))
}

fn number_param(params: &[Value], index: usize, rule: &str) -> Result<f64, RuleViolation> {
    params
        .get(index)
        .and_then(Value::as_number)
        .ok_or_else(|| RuleViolation::new(format!("{} rule requires a numeric parameter #{}", rule, index + 1)))
}

fn count_param(params: &[Value], index: usize, rule: &str) -> Result<usize, RuleViolation> {
    params
        .get(index)
        .and_then(Value::as_integer)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| RuleViolation::new(format!("{} rule requires a non-negative integer parameter #{}", rule, index + 1)))
}

fn text_param<'a>(params: &'a [Value], rule: &str) -> Result<&'a str, RuleViolation> {
    params
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| RuleViolation::new(format!("{} rule requires a string parameter", rule)))
}

fn text<'a>(value: &'a Value, what: &str) -> Result<&'a str, RuleViolation> {
    value
        .as_str()
        .ok_or_else(|| RuleViolation::new(format!("{} must be a string", what)))
}

/// Fails on null. With a `true` parameter an empty string counts as absent.
fn required(value: &Value, params: &[Value]) -> RuleResult {
    let empty_is_absent = params.first().map(Value::to_bool).unwrap_or(false);
    match value {
        Value::Null => fail("Property is required."),
        Value::String(s) if empty_is_absent && s.is_empty() => fail("Property is required."),
        _ => Ok(()),
    }
}

/// Like `required`, but blank strings and empty lists are absent too
fn filled(value: &Value, _: &[Value]) -> RuleResult {
    match value {
        Value::Null => fail("Property is required."),
        Value::String(s) if predicates::is_blank(s) => fail("Property must not be empty."),
        Value::Array(items) if items.is_empty() => fail("Property must not be empty."),
        _ => Ok(()),
    }
}

fn positive_int(value: &Value, _: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    match value.as_integer() {
        Some(n) => predicates::validate_positive(n).map_err(RuleViolation::from),
        None => fail(format!("Must be a positive integer, found {}", value.type_name())),
    }
}

fn int(value: &Value, _: &[Value]) -> RuleResult {
    if value.is_null() || value.as_integer().is_some() {
        Ok(())
    } else {
        fail("Must be an integer")
    }
}

fn numeric(value: &Value, _: &[Value]) -> RuleResult {
    if value.is_null() || value.as_number().is_some() {
        Ok(())
    } else {
        fail("Must be a number")
    }
}

/// Inclusive bounds; accepts numeric-looking strings
fn range(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let min = number_param(params, 0, "range")?;
    let max = number_param(params, 1, "range")?;
    match value.as_number() {
        Some(n) => predicates::validate_range(n, min, max).map_err(RuleViolation::from),
        None => fail(format!("Must be a number between {} and {}", min, max)),
    }
}

fn min(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let min = number_param(params, 0, "min")?;
    match value.as_number() {
        Some(n) => predicates::validate_min(n, min).map_err(RuleViolation::from),
        None => fail("Must be a number"),
    }
}

fn max(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let max = number_param(params, 0, "max")?;
    match value.as_number() {
        Some(n) => predicates::validate_max(n, max).map_err(RuleViolation::from),
        None => fail("Must be a number"),
    }
}

/// `length(min)` or `length(min, max)`; strings count characters, arrays items
fn length(value: &Value, params: &[Value]) -> RuleResult {
    let min = count_param(params, 0, "length")?;
    let max = match params.get(1) {
        Some(_) => Some(count_param(params, 1, "length")?),
        None => None,
    };

    match (value, max) {
        (Value::Null, _) => Ok(()),
        (Value::String(s), Some(max)) => predicates::validate_length(s, min, max).map_err(RuleViolation::from),
        (Value::String(s), None) => predicates::validate_min_length(s, min).map_err(RuleViolation::from),
        (Value::Array(items), Some(max)) if items.len() < min || items.len() > max => {
            fail(format!("Must have between {} and {} items", min, max))
        }
        (Value::Array(items), _) => predicates::validate_min_items(items, min).map_err(RuleViolation::from),
        (other, _) => fail(format!("Length applies to strings and lists, found {}", other.type_name())),
    }
}

fn min_length(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let min = count_param(params, 0, "minLength")?;
    predicates::validate_min_length(text(value, "Value")?, min).map_err(RuleViolation::from)
}

fn max_length(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let max = count_param(params, 0, "maxLength")?;
    predicates::validate_max_length(text(value, "Value")?, max).map_err(RuleViolation::from)
}

/// One message per malformed address: the first structural defect found
fn email(value: &Value, _: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    predicates::validate_email(text(value, "Email")?).map_err(RuleViolation::from)
}

fn no_public_domain(value: &Value, public: &[String]) -> RuleResult {
    match value.as_str() {
        Some(address) if predicates::is_public_domain(address, public) => {
            fail("Public email domains are not allowed")
        }
        _ => Ok(()),
    }
}

/// Domains given as parameters are blocked on top of the configured list
fn blocked_domains(value: &Value, params: &[Value], configured: &[String]) -> RuleResult {
    let Some(address) = value.as_str() else {
        return Ok(());
    };
    let from_params: Vec<String> = params.iter().filter_map(Value::as_str).map(str::to_string).collect();
    if predicates::is_blocked_domain(address, configured) || predicates::is_blocked_domain(address, &from_params) {
        fail("Email domain is blocked")
    } else {
        Ok(())
    }
}

fn url(value: &Value, _: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    if predicates::is_valid_url(text(value, "URL")?) {
        Ok(())
    } else {
        fail("Invalid URL")
    }
}

fn pattern(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let source = text_param(params, "regex")?;
    let subject = text(value, "Value")?;

    let mut cache = REGEX_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if !cache.contains_key(source) {
        let compiled = Regex::new(source)
            .map_err(|_| RuleViolation::new(format!("Invalid regex pattern `{}`", source)))?;
        cache.insert(source.to_string(), compiled);
    }

    if cache.get(source).is_some_and(|re| re.is_match(subject)) {
        Ok(())
    } else {
        fail("Invalid format")
    }
}

fn joined(params: &[Value]) -> String {
    params.iter().map(Value::to_string).collect::<Vec<_>>().join(", ")
}

/// Compares by display form so `"5"` matches a `5` parameter
fn one_of(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let shown = value.to_string();
    let allowed: Vec<String> = params.iter().map(Value::to_string).collect();
    let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
    if predicates::is_one_of(&shown, &allowed) {
        Ok(())
    } else {
        fail(format!("Must be one of: {}", joined(params)))
    }
}

fn not_one_of(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let shown = value.to_string();
    if params.iter().any(|p| p.to_string() == shown) {
        fail(format!("Must not be one of: {}", joined(params)))
    } else {
        Ok(())
    }
}

fn starts_with(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let prefix = text_param(params, "startsWith")?;
    if predicates::starts_with(text(value, "Value")?, prefix) {
        Ok(())
    } else {
        fail(format!("Must start with '{}'", prefix))
    }
}

fn ends_with(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let suffix = text_param(params, "endsWith")?;
    if predicates::ends_with(text(value, "Value")?, suffix) {
        Ok(())
    } else {
        fail(format!("Must end with '{}'", suffix))
    }
}

fn contains(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let needle = text_param(params, "contains")?;
    if predicates::contains(text(value, "Value")?, needle) {
        Ok(())
    } else {
        fail(format!("Must contain '{}'", needle))
    }
}

fn list<'a>(value: &'a Value) -> Result<&'a [Value], RuleViolation> {
    value
        .as_array()
        .ok_or_else(|| RuleViolation::new(format!("Must be a list, found {}", value.type_name())))
}

fn min_items(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let min = count_param(params, 0, "minItems")?;
    predicates::validate_min_items(list(value)?, min).map_err(RuleViolation::from)
}

fn max_items(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let max = count_param(params, 0, "maxItems")?;
    predicates::validate_max_items(list(value)?, max).map_err(RuleViolation::from)
}

fn unique(value: &Value, _: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    predicates::validate_unique(list(value)?).map_err(RuleViolation::from)
}

fn password(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let level = params.first().and_then(Value::as_str).unwrap_or("strong");
    predicates::validate_password(text(value, "Password")?, level).map_err(RuleViolation::from)
}

/// `type(int)` etc.; reports the found type against the expected one
fn type_match(value: &Value, params: &[Value]) -> RuleResult {
    if value.is_null() {
        return Ok(());
    }
    let expected = text_param(params, "type")?;
    if expected == "record" {
        return match value {
            Value::Record(_) => Ok(()),
            other => fail(format!("found {}, expected record", other.type_name())),
        };
    }
    let ty = FieldType::parse(expected)
        .ok_or_else(|| RuleViolation::new(format!("Unknown type `{}`", expected)))?;
    if ty.matches(value) {
        Ok(())
    } else {
        fail(format!("found {}, expected {}", value.type_name(), expected))
    }
}
