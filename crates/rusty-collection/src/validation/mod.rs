// File: src/validation/mod.rs
// Purpose: Validator engine: plans rule triples, runs them, aggregates failures

use std::collections::HashMap;
use std::collections::HashSet;

pub mod errors;
pub mod sources;

pub use errors::{ErrorBag, ErrorMap, ValidationException};
pub use sources::{
    InlineRules, ReflectedRules, RuleSource, RuleTable, RuleTriple, Strategy, DEFAULT_SCENARIO,
};

use crate::collection::Collection;
use crate::config::{EmptyString, RequiredPolicy, ValidationConfig};
use crate::error::{Error, Result};
use crate::rules::{Predicate, RuleRegistry};
use crate::value::Value;

/// Lifecycle of one validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidatorState {
    #[default]
    Idle,
    Running,
    Passed,
    Failed,
}

/// Runs every applicable rule against one collection and collects all
/// failures of the pass into a single `ValidationException`.
///
/// A validator handles one pass at a time (`validate` takes `&mut self`);
/// concurrent passes need separate instances.
pub struct Validator<'a> {
    record: &'a Collection,
    registry: RuleRegistry,
    sources: Vec<Box<dyn RuleSource + 'a>>,
    policy: RequiredPolicy,
    log_failures: bool,
    state: ValidatorState,
    last: Option<ValidationException>,
}

/// A triple with its resolved predicate
struct Planned {
    triple: RuleTriple,
    strategy: Strategy,
    predicate: Predicate,
}

impl<'a> Validator<'a> {
    /// Validator with no rule sources, using the global registry
    pub fn new(record: &'a Collection) -> Self {
        Self {
            record,
            registry: RuleRegistry::global(),
            sources: Vec::new(),
            policy: RequiredPolicy::default(),
            log_failures: true,
            state: ValidatorState::Idle,
            last: None,
        }
    }

    /// Reflected, inline and table rules of the record's schema
    pub fn for_collection(record: &'a Collection) -> Self {
        let mut validator = Self::new(record).source(ReflectedRules).source(InlineRules);
        if let Some(table) = record.schema().rule_table() {
            validator = validator.source(table.clone());
        }
        validator
    }

    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Apply the empty-string policy and logging switch from configuration
    pub fn with_config(mut self, config: &ValidationConfig) -> Self {
        self.policy = config.required;
        self.log_failures = config.log_failures;
        self
    }

    pub fn source(mut self, source: impl RuleSource + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn state(&self) -> ValidatorState {
        self.state
    }

    /// Aggregate of the last failed pass
    pub fn errors(&self) -> Option<&ValidationException> {
        self.last.as_ref()
    }

    /// Run one pass. Every rule runs; failures never short-circuit.
    ///
    /// Rule names are resolved before anything runs, so an unknown rule
    /// fails the call with `Error::UnknownRule` and leaves the validator
    /// idle.
    pub fn validate(&mut self, scenario: Option<&str>) -> Result<()> {
        self.state = ValidatorState::Running;
        self.last = None;

        let plan = match self.plan(scenario) {
            Ok(plan) => plan,
            Err(err) => {
                self.state = ValidatorState::Idle;
                return Err(err);
            }
        };

        let mut bag = ErrorBag::new();
        for planned in &plan {
            let value = self.record.field_value(&planned.triple.field);
            let params = self.params_for(planned);
            if let Err(violation) = (planned.predicate)(&value, &params) {
                bag.record(&planned.triple.field, &planned.triple.rule, violation.message());
            }
        }

        match bag.finish() {
            Ok(()) => {
                self.state = ValidatorState::Passed;
                Ok(())
            }
            Err(exception) => {
                if self.log_failures {
                    tracing::debug!(
                        record = %self.record.schema().name(),
                        scenario = scenario.unwrap_or(DEFAULT_SCENARIO),
                        fields = %exception.summary(),
                        "validation failed"
                    );
                }
                self.state = ValidatorState::Failed;
                self.last = Some(exception.clone());
                Err(Error::Invalid(exception))
            }
        }
    }

    /// `validate` as a boolean. Unknown rules still propagate.
    pub fn passes(&mut self, scenario: Option<&str>) -> Result<bool> {
        match self.validate(scenario) {
            Ok(()) => Ok(true),
            Err(Error::Invalid(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Collect triples from every source, ordered by field declaration and
    /// then source order, and resolve their predicates.
    fn plan(&self, scenario: Option<&str>) -> Result<Vec<Planned>> {
        let schema = self.record.schema();
        let scoped = matches!(scenario, Some(name) if name != DEFAULT_SCENARIO);

        let mut collected: Vec<(usize, Strategy, RuleTriple)> = Vec::new();
        let mut requested: HashSet<String> = HashSet::new();
        let mut unbound: Vec<(usize, Strategy, Vec<RuleTriple>)> = Vec::new();

        for (index, source) in self.sources.iter().enumerate() {
            let triples = source.triples(schema, scenario);
            if scoped && !source.scenario_bound() {
                unbound.push((index, source.strategy(), triples));
                continue;
            }
            for triple in triples {
                requested.insert(triple.field.clone());
                collected.push((index, source.strategy(), triple));
            }
        }

        // Type-derived rules follow the fields a named scenario asks for
        for (index, strategy, triples) in unbound {
            collected.extend(
                triples
                    .into_iter()
                    .filter(|t| requested.contains(&t.field))
                    .map(|t| (index, strategy, t)),
            );
        }

        let mut undeclared: HashMap<String, usize> = HashMap::new();
        let mut ranked = Vec::with_capacity(collected.len());
        for (index, strategy, triple) in collected {
            let rank = match schema.position(&triple.field) {
                Some(position) => position,
                None => {
                    let next = schema.len() + undeclared.len();
                    *undeclared.entry(triple.field.clone()).or_insert(next)
                }
            };
            ranked.push(((rank, index), strategy, triple));
        }
        ranked.sort_by_key(|(key, _, _)| *key);

        ranked
            .into_iter()
            .map(|(_, strategy, triple)| {
                let predicate = self.registry.resolve(&triple.rule)?;
                Ok(Planned {
                    triple,
                    strategy,
                    predicate,
                })
            })
            .collect()
    }

    fn params_for(&self, planned: &Planned) -> Vec<Value> {
        let policy = match planned.strategy {
            Strategy::Table => self.policy.table,
            Strategy::Inline => self.policy.inline,
            Strategy::Reflected => self.policy.reflected,
        };
        let triple = &planned.triple;
        if triple.rule == "required" && triple.params.is_empty() && policy == EmptyString::Absent {
            vec![Value::Bool(true)]
        } else {
            triple.params.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Mode;
    use crate::schema::{FieldDef, FieldType, Schema};
    use crate::rules::RuleViolation;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn payment_schema() -> Arc<Schema> {
        Schema::builder("Payment")
            .field(FieldDef::new("id", FieldType::Int).nullable())
            .field(FieldDef::new("amount", FieldType::Int).nullable())
            .field(FieldDef::new("memo", FieldType::String).nullable())
            .build()
    }

    fn payment(id: Value, amount: Value) -> Collection {
        Collection::new(payment_schema(), [("id", id), ("amount", amount)], Mode::Strict).unwrap()
    }

    fn table() -> RuleTable {
        RuleTable::new()
            .rule("required", ["id"])
            .rule("positiveInt", ["amount"])
    }

    #[test]
    fn test_collects_every_failure() {
        let record = payment(Value::Null, Value::Int(-5));
        let mut validator = Validator::new(&record).source(table());

        let err = validator.validate(None).unwrap_err();
        let exception = err.validation().unwrap();
        assert_eq!(
            exception.to_json(),
            serde_json::json!({"errors": {
                "id": {"required": "Property is required."},
                "amount": {"positiveInt": "Must be a positive integer"}
            }})
        );
        assert_eq!(validator.state(), ValidatorState::Failed);
        assert_eq!(validator.errors(), Some(exception));
    }

    #[test]
    fn test_valid_record_passes() {
        let record = payment(Value::Int(1), Value::Int(5));
        let mut validator = Validator::new(&record).source(table());
        assert_eq!(validator.state(), ValidatorState::Idle);
        validator.validate(None).unwrap();
        assert_eq!(validator.state(), ValidatorState::Passed);
        assert!(validator.errors().is_none());
    }

    #[test]
    fn test_repeated_passes_agree() {
        let record = payment(Value::Null, Value::from("abc"));
        let mut validator = Validator::new(&record).source(table());
        let first = validator.validate(None).unwrap_err().validation().cloned();
        let second = validator.validate(None).unwrap_err().validation().cloned();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_rule_is_immediate() {
        let record = payment(Value::Null, Value::Int(-5));
        let mut validator =
            Validator::new(&record).source(table().rule("noSuchRule", ["memo"]));

        let err = validator.validate(None).unwrap_err();
        assert!(matches!(err, Error::UnknownRule(ref name) if name == "noSuchRule"));
        assert_eq!(validator.state(), ValidatorState::Idle);
        assert!(validator.passes(None).is_err());
    }

    #[test]
    fn test_triples_follow_declaration_order() {
        let record = payment(Value::Null, Value::Int(-5));
        let reversed = RuleTable::new()
            .rule("positiveInt", ["amount"])
            .rule("required", ["ghost", "id"]);
        let mut validator = Validator::new(&record).source(reversed);

        let err = validator.validate(None).unwrap_err();
        let fields: Vec<_> = err.validation().unwrap().fields().collect();
        assert_eq!(fields, vec!["id", "amount", "ghost"]);
    }

    #[test]
    fn test_empty_string_policy_per_strategy() {
        let schema = Schema::builder("Note")
            .field(FieldDef::new("title", FieldType::String))
            .build();
        let record = Collection::new(schema, [("title", "")], Mode::Strict).unwrap();

        // Table rules treat "" as present by default
        let mut table_only = Validator::new(&record).source(RuleTable::new().rule("required", ["title"]));
        assert!(table_only.passes(None).unwrap());

        // Reflected rules treat "" as absent by default
        let mut reflected = Validator::new(&record).source(ReflectedRules);
        assert!(!reflected.passes(None).unwrap());

        let config = ValidationConfig {
            required: RequiredPolicy {
                table: EmptyString::Absent,
                ..RequiredPolicy::default()
            },
            ..ValidationConfig::default()
        };
        let mut strict_table = Validator::new(&record)
            .with_config(&config)
            .source(RuleTable::new().rule("required", ["title"]));
        assert!(!strict_table.passes(None).unwrap());
    }

    #[test]
    fn test_scenario_isolation() {
        let schema = Schema::builder("Signup")
            .field(FieldDef::new("email", FieldType::String))
            .field(FieldDef::new("age", FieldType::Int))
            .build();
        let record = Collection::new(schema, [("email", Value::from("x@example.com"))], Mode::Strict).unwrap();

        let rules = RuleTable::new()
            .scenario("age-check", |t| t.rule("required", ["age"]))
            .scenario("contact", |t| t.rule("email", ["email"]));

        let mut validator = Validator::new(&record).source(ReflectedRules).source(rules);
        // `age` is missing, but only the age scenario asks for it
        assert!(validator.passes(Some("contact")).unwrap());

        let err = validator.validate(Some("age-check")).unwrap_err();
        let fields: Vec<_> = err.validation().unwrap().fields().collect();
        assert_eq!(fields, vec!["age"]);
    }

    #[test]
    fn test_custom_registry() {
        let record = payment(Value::Int(3), Value::Int(5));
        let mut registry = RuleRegistry::new();
        registry.register("even", |value, _| match value.as_integer() {
            Some(n) if n % 2 != 0 => Err(RuleViolation::new("Must be even")),
            _ => Ok(()),
        });

        let mut validator = Validator::new(&record)
            .with_registry(registry)
            .source(RuleTable::new().rule("even", ["id", "amount"]));
        let err = validator.validate(None).unwrap_err();
        let exception = err.validation().unwrap();
        assert_eq!(exception.get_error("id", "even"), Some("Must be even"));
        assert_eq!(exception.get_error("amount", "even"), Some("Must be even"));
    }
}
