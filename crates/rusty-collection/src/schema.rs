// File: src/schema.rs
// Purpose: Declared field tables, built once per record type

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::collection::Collection;
use crate::validation::RuleTable;
use crate::value::Value;

/// Computes a virtual field or an extra projection value from the record
pub type Getter = Arc<dyn Fn(&Collection) -> Value + Send + Sync>;

/// Receives a value assigned to a virtual field
pub type Setter = Arc<dyn Fn(&mut Collection, Value) + Send + Sync>;

/// Declared type of a field
#[derive(Clone)]
pub enum FieldType {
    Any,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    /// Nested collection; object input is constructed against this schema
    Record(Arc<Schema>),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Record(_) => "record",
        }
    }

    /// Parse a type name as used by the `type` rule.
    /// `record` is not parseable since it needs a schema.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "any" | "mixed" => Some(FieldType::Any),
            "bool" | "boolean" => Some(FieldType::Bool),
            "int" | "integer" => Some(FieldType::Int),
            "float" | "double" => Some(FieldType::Float),
            "string" => Some(FieldType::String),
            "array" => Some(FieldType::Array),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }

    /// Scalars get an implicit `required` when declared non-nullable
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldType::Bool | FieldType::Int | FieldType::Float | FieldType::String
        )
    }

    /// Whether a non-null value has this type. Ints are accepted as floats.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Any, _) => true,
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Int, Value::Int(_)) => true,
            (FieldType::Float, Value::Float(_) | Value::Int(_)) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Array, Value::Array(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            (FieldType::Record(schema), Value::Record(record)) => {
                record.schema().name() == schema.name()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Record(schema) => write!(f, "Record({})", schema.name()),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Excluded from projection unless named as an extra field
    Hidden,
}

/// Storage kind of a field
#[derive(Clone)]
pub enum FieldKind {
    Stored,
    /// Never stored; read through `getter`, assigned through `setter`
    Virtual {
        getter: Option<Getter>,
        setter: Option<Setter>,
    },
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Stored => f.write_str("Stored"),
            FieldKind::Virtual { getter, setter } => f
                .debug_struct("Virtual")
                .field("getter", &getter.is_some())
                .field("setter", &setter.is_some())
                .finish(),
        }
    }
}

/// A rule declaration attached to a field: name, parameters and the
/// scenarios it belongs to (empty = every scenario)
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    pub name: String,
    pub params: Vec<Value>,
    pub scenarios: Vec<String>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            scenarios: Vec::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            scenarios: Vec::new(),
        }
    }

    /// Restrict the rule to the given scenarios
    pub fn on<I, S>(mut self, scenarios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenarios = scenarios.into_iter().map(Into::into).collect();
        self
    }

    /// An untagged rule applies everywhere; no scenario means "default"
    pub fn applies_to(&self, scenario: Option<&str>) -> bool {
        if self.scenarios.is_empty() {
            return true;
        }
        let wanted = scenario.unwrap_or(crate::validation::DEFAULT_SCENARIO);
        self.scenarios.iter().any(|s| s == wanted)
    }

    /// Parse an annotation such as `range 10 20`, `length 3, 12` or
    /// `in "draft" "published"`.
    ///
    /// Numbers become ints or floats, `true`/`false`/`null` their literal
    /// values, anything else (quoted or bare) a string.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = tokenize(text).into_iter();
        let (name, _) = tokens.next()?;
        if name.is_empty() {
            return None;
        }
        let params = tokens.map(|(token, quoted)| parse_param(&token, quoted)).collect();
        Some(Self {
            name,
            params,
            scenarios: Vec::new(),
        })
    }
}

fn tokenize(text: &str) -> Vec<(String, bool)> {
    let mut tokens = Vec::new();
    let mut chars = text.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
            continue;
        }
        if c == '"' || c == '\'' {
            chars.next();
            let token: String = chars.by_ref().take_while(|&ch| ch != c).collect();
            tokens.push((token, true));
            continue;
        }
        let mut token = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() || ch == ',' {
                break;
            }
            token.push(ch);
            chars.next();
        }
        tokens.push((token, false));
    }

    tokens
}

fn parse_param(token: &str, quoted: bool) -> Value {
    if quoted {
        return Value::String(token.to_string());
    }
    if let Ok(n) = token.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(n) = token.parse::<f64>() {
        return Value::Float(n);
    }
    match token {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(token.to_string()),
    }
}

/// One declared field of a record type
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    ty: FieldType,
    nullable: bool,
    default: Value,
    visibility: Visibility,
    kind: FieldKind,
    rules: Vec<RuleSpec>,
}

impl FieldDef {
    /// A stored, public, non-nullable field
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: Value::Null,
            visibility: Visibility::Public,
            kind: FieldKind::Stored,
            rules: Vec::new(),
        }
    }

    /// A virtual field; attach `.get(..)` / `.set(..)` to make it useful
    pub fn virtual_field(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            kind: FieldKind::Virtual {
                getter: None,
                setter: None,
            },
            nullable: true,
            ..Self::new(name, ty)
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn get<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Collection) -> Value + Send + Sync + 'static,
    {
        if let FieldKind::Virtual { getter: slot, .. } = &mut self.kind {
            *slot = Some(Arc::new(getter));
        }
        self
    }

    pub fn set<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut Collection, Value) + Send + Sync + 'static,
    {
        if let FieldKind::Virtual { setter: slot, .. } = &mut self.kind {
            *slot = Some(Arc::new(setter));
        }
        self
    }

    pub fn rule(mut self, name: impl Into<String>) -> Self {
        self.rules.push(RuleSpec::new(name));
        self
    }

    pub fn rule_with(mut self, name: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        self.rules.push(RuleSpec::with_params(name, params));
        self
    }

    pub fn rule_spec(mut self, spec: RuleSpec) -> Self {
        self.rules.push(spec);
        self
    }

    /// Inline annotation text, e.g. `range 10 20`. Blank text is ignored.
    pub fn annotation(mut self, text: &str) -> Self {
        match RuleSpec::parse(text) {
            Some(spec) => self.rules.push(spec),
            None => tracing::debug!(field = %self.name, "ignoring empty rule annotation"),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Value a fresh collection starts with
    pub fn initial_value(&self) -> &Value {
        &self.default
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, FieldKind::Virtual { .. })
    }

    pub fn getter(&self) -> Option<&Getter> {
        match &self.kind {
            FieldKind::Virtual { getter, .. } => getter.as_ref(),
            FieldKind::Stored => None,
        }
    }

    pub fn setter(&self) -> Option<&Setter> {
        match &self.kind {
            FieldKind::Virtual { setter, .. } => setter.as_ref(),
            FieldKind::Stored => None,
        }
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }
}

/// Ordered field table for a record type
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
    index: HashMap<String, usize>,
    extras: Vec<(String, Getter)>,
    rule_table: Option<RuleTable>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                name: name.into(),
                fields: Vec::new(),
                index: HashMap::new(),
                extras: Vec::new(),
                rule_table: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Declaration position of a field
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extra-field resolver registered for this record type
    pub fn extra(&self, name: &str) -> Option<&Getter> {
        self.extras.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    pub fn extra_names(&self) -> impl Iterator<Item = &str> {
        self.extras.iter().map(|(n, _)| n.as_str())
    }

    /// Explicit rule table declared for this record type
    pub fn rule_table(&self) -> Option<&RuleTable> {
        self.rule_table.as_ref()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("extras", &self.extras.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("rule_table", &self.rule_table)
            .finish()
    }
}

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declare a field. Redeclaring a name replaces the earlier definition
    /// in place.
    pub fn field(mut self, def: FieldDef) -> Self {
        match self.schema.index.get(def.name()) {
            Some(&i) => {
                tracing::debug!(record = %self.schema.name, field = %def.name(), "field redeclared");
                self.schema.fields[i] = def;
            }
            None => {
                self.schema
                    .index
                    .insert(def.name().to_string(), self.schema.fields.len());
                self.schema.fields.push(def);
            }
        }
        self
    }

    /// Register an extra-field resolver for projection
    pub fn extra<F>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&Collection) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        self.schema.extras.retain(|(n, _)| *n != name);
        self.schema.extras.push((name, Arc::new(resolver)));
        self
    }

    /// Attach an explicit rule table
    pub fn rules(mut self, table: RuleTable) -> Self {
        self.schema.rule_table = Some(table);
        self
    }

    pub fn build(self) -> Arc<Schema> {
        Arc::new(self.schema)
    }
}

/// Record types with a statically declared schema.
///
/// Implemented by `#[derive(Collection)]`.
pub trait Record {
    fn schema() -> Arc<Schema>;
}
