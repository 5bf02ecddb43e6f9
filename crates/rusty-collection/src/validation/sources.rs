// File: src/validation/sources.rs
// Purpose: Rule sources that produce (field, rule, params) triples

use indexmap::IndexMap;

use crate::schema::{FieldType, Schema};
use crate::value::Value;

/// Scenario used when `validate` is called without one
pub const DEFAULT_SCENARIO: &str = "default";

/// One planned rule invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTriple {
    pub field: String,
    pub rule: String,
    pub params: Vec<Value>,
}

impl RuleTriple {
    pub fn new(field: impl Into<String>, rule: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            params,
        }
    }
}

/// Where a triple came from; selects the `required` empty-string policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Explicit rule table
    Table,
    /// Rules declared on the field itself
    Inline,
    /// Derived from the field's type and nullability
    Reflected,
}

/// Produces rule triples for one validation pass
pub trait RuleSource {
    fn strategy(&self) -> Strategy;

    fn triples(&self, schema: &Schema, scenario: Option<&str>) -> Vec<RuleTriple>;

    /// Whether this source selects fields per scenario. Sources that are
    /// not apply only to fields some scenario-bound source requests when
    /// a named scenario is active.
    fn scenario_bound(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TableEntry {
    rule: String,
    fields: Vec<String>,
    params: Vec<Value>,
}

/// Explicit rule table: rule name -> field list (+ shared params), with
/// optional per-scenario entry sets.
///
/// ```ignore
/// let table = RuleTable::new()
///     .rule("required", ["id"])
///     .rule_with("range", ["amount"], [Value::Int(1), Value::Int(100)])
///     .scenario("all-required", |t| t.rule("required", ["id", "amount"]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    default: Vec<TableEntry>,
    scenarios: IndexMap<String, Vec<TableEntry>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule<I, S>(self, rule: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_with(rule, fields, Vec::new())
    }

    pub fn rule_with<I, S, P>(mut self, rule: impl Into<String>, fields: I, params: P) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        P: IntoIterator<Item = Value>,
    {
        self.default.push(TableEntry {
            rule: rule.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            params: params.into_iter().collect(),
        });
        self
    }

    /// Rules that replace the default set when `name` is validated.
    /// Naming the default scenario adds to the default set.
    pub fn scenario(mut self, name: impl Into<String>, build: impl FnOnce(RuleTable) -> RuleTable) -> Self {
        let name = name.into();
        let built = build(RuleTable::new());
        if name == DEFAULT_SCENARIO {
            self.default.extend(built.default);
        } else {
            self.scenarios.entry(name).or_default().extend(built.default);
        }
        self
    }

    pub fn scenario_names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    fn entries(&self, scenario: Option<&str>) -> &[TableEntry] {
        match scenario {
            None | Some(DEFAULT_SCENARIO) => &self.default,
            Some(name) => match self.scenarios.get(name) {
                Some(entries) => entries,
                None => {
                    tracing::debug!(scenario = name, "no table rules for scenario");
                    &[]
                }
            },
        }
    }
}

impl RuleSource for RuleTable {
    fn strategy(&self) -> Strategy {
        Strategy::Table
    }

    fn triples(&self, _schema: &Schema, scenario: Option<&str>) -> Vec<RuleTriple> {
        self.entries(scenario)
            .iter()
            .flat_map(|entry| {
                entry
                    .fields
                    .iter()
                    .map(|field| RuleTriple::new(field.clone(), entry.rule.clone(), entry.params.clone()))
            })
            .collect()
    }
}

/// Rules declared on each field of the schema
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineRules;

impl RuleSource for InlineRules {
    fn strategy(&self) -> Strategy {
        Strategy::Inline
    }

    fn triples(&self, schema: &Schema, scenario: Option<&str>) -> Vec<RuleTriple> {
        schema
            .fields()
            .flat_map(|def| {
                def.rules()
                    .iter()
                    .filter(|spec| spec.applies_to(scenario))
                    .map(|spec| RuleTriple::new(def.name(), spec.name.clone(), spec.params.clone()))
            })
            .collect()
    }
}

/// Rules implied by field types: a non-nullable scalar is `required` and
/// type-checked, any other typed field is only type-checked
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectedRules;

impl RuleSource for ReflectedRules {
    fn strategy(&self) -> Strategy {
        Strategy::Reflected
    }

    fn triples(&self, schema: &Schema, _scenario: Option<&str>) -> Vec<RuleTriple> {
        let mut triples = Vec::new();
        for def in schema.fields() {
            let ty = def.ty();
            if matches!(ty, FieldType::Any) {
                continue;
            }
            if ty.is_scalar() && !def.is_nullable() {
                triples.push(RuleTriple::new(def.name(), "required", Vec::new()));
            }
            triples.push(RuleTriple::new(def.name(), "type", vec![Value::from(ty.name())]));
        }
        triples
    }

    fn scenario_bound(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, RuleSpec};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Schema::builder("Payment")
            .field(FieldDef::new("id", FieldType::Int).nullable().rule("required"))
            .field(
                FieldDef::new("amount", FieldType::Int)
                    .annotation("range 10 20")
                    .rule_spec(RuleSpec::new("positiveInt").on(["strict"])),
            )
            .field(FieldDef::new("meta", FieldType::Any))
            .build()
    }

    fn pairs(triples: &[RuleTriple]) -> Vec<(&str, &str)> {
        triples.iter().map(|t| (t.field.as_str(), t.rule.as_str())).collect()
    }

    #[test]
    fn test_table_scenarios() {
        let table = RuleTable::new()
            .rule("required", ["id", "amount"])
            .scenario("custom", |t| t.rule_with("range", ["amount"], [Value::Int(1), Value::Int(5)]));

        let schema = schema();
        assert_eq!(
            pairs(&table.triples(&schema, None)),
            vec![("id", "required"), ("amount", "required")]
        );
        assert_eq!(
            table.triples(&schema, Some("custom")),
            vec![RuleTriple::new("amount", "range", vec![Value::Int(1), Value::Int(5)])]
        );
        assert!(table.triples(&schema, Some("missing")).is_empty());
    }

    #[test]
    fn test_default_scenario_block_extends_default_rules() {
        let table = RuleTable::new()
            .rule("positiveInt", ["amount"])
            .scenario(DEFAULT_SCENARIO, |t| t.rule("required", ["id"]));

        let schema = schema();
        let expected = vec![("amount", "positiveInt"), ("id", "required")];
        assert_eq!(pairs(&table.triples(&schema, None)), expected);
        assert_eq!(pairs(&table.triples(&schema, Some("default"))), expected);
        assert_eq!(table.scenario_names().count(), 0);
    }

    #[test]
    fn test_inline_filters_by_scenario() {
        let schema = schema();
        assert_eq!(
            pairs(&InlineRules.triples(&schema, None)),
            vec![("id", "required"), ("amount", "range")]
        );
        assert_eq!(
            pairs(&InlineRules.triples(&schema, Some("strict"))),
            vec![("id", "required"), ("amount", "range"), ("amount", "positiveInt")]
        );
    }

    #[test]
    fn test_reflected_from_types() {
        let triples = ReflectedRules.triples(&schema(), None);
        assert_eq!(
            pairs(&triples),
            vec![("id", "type"), ("amount", "required"), ("amount", "type")]
        );
        assert_eq!(triples[0].params, vec![Value::from("int")]);
    }
}
