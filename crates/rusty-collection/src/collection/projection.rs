// File: src/collection/projection.rs
// Purpose: Ordered map projection of a collection (`to_array`)

use indexmap::IndexMap;

use super::{Collection, NULL};
use crate::value::Value;

/// Path segment matching every nested record at its level
const WILDCARD: &str = "*";

/// Options for `Collection::to_array`
#[derive(Debug, Clone, Default)]
pub struct Projection {
    fields: Option<Vec<String>>,
    extra_fields: Vec<String>,
    include_nulls: bool,
}

impl Projection {
    /// Every public field, nulls omitted, no extras
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow-list of dotted paths, e.g. `["id", "empty.lies"]`
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Extra fields: virtual or hidden fields and registered resolvers.
    /// `*.name` applies `name` under every nested record.
    pub fn extra_fields<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_fields = extra.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_nulls(mut self, include: bool) -> Self {
        self.include_nulls = include;
        self
    }
}

/// Dotted paths folded into a tree. `whole` marks a path that ends here.
#[derive(Debug, Clone, Default)]
struct PathTree {
    whole: bool,
    children: IndexMap<String, PathTree>,
}

impl PathTree {
    fn build(paths: &[String]) -> Self {
        let mut root = PathTree::default();
        for path in paths {
            let mut node = &mut root;
            for segment in path.split('.').filter(|s| !s.is_empty()) {
                node = node.children.entry(segment.to_string()).or_default();
            }
            node.whole = true;
        }
        root
    }

    /// Subtree for a nested name, merged with the wildcard subtree
    fn for_nested(&self, name: &str) -> PathTree {
        let mut merged = PathTree::default();
        for key in [name, WILDCARD] {
            if let Some(sub) = self.children.get(key) {
                merged.merge(sub);
            }
        }
        merged
    }

    fn merge(&mut self, other: &PathTree) {
        self.whole |= other.whole;
        for (name, sub) in &other.children {
            self.children.entry(name.clone()).or_default().merge(sub);
        }
    }
}

/// What the allow-list keeps of one field
enum Selection {
    All,
    Partial(PathTree),
    Excluded,
}

pub(crate) fn project(record: &Collection, projection: &Projection) -> IndexMap<String, Value> {
    let allow = projection.fields.as_deref().map(PathTree::build);
    let extras = PathTree::build(&projection.extra_fields);
    project_level(record, allow.as_ref(), &extras, projection.include_nulls)
}

fn select(allow: Option<&PathTree>, name: &str) -> Selection {
    let Some(tree) = allow else {
        return Selection::All;
    };
    let sub = tree.for_nested(name);
    if sub.whole {
        Selection::All
    } else if sub.children.is_empty() {
        Selection::Excluded
    } else {
        Selection::Partial(sub)
    }
}

fn project_level(
    record: &Collection,
    allow: Option<&PathTree>,
    extras: &PathTree,
    include_nulls: bool,
) -> IndexMap<String, Value> {
    let schema = record.schema();
    let mut out = IndexMap::new();

    for def in schema.fields().filter(|d| !d.is_virtual() && !d.is_hidden()) {
        let name = def.name();
        let value = record.value(name).unwrap_or(&NULL);
        let nested_extras = extras.for_nested(name);

        let rendered = match select(allow, name) {
            Selection::All => render(value, None, &nested_extras, include_nulls),
            Selection::Partial(sub) => render(value, Some(&sub), &nested_extras, include_nulls),
            Selection::Excluded => match value {
                // Extras under an excluded record still surface
                Value::Record(nested) if !nested_extras.children.is_empty() => {
                    let only_extras = PathTree::default();
                    let map = project_level(nested, Some(&only_extras), &nested_extras, include_nulls);
                    if map.is_empty() {
                        continue;
                    }
                    Value::Object(map)
                }
                _ => continue,
            },
        };

        if rendered.is_null() && !include_nulls {
            continue;
        }
        out.insert(name.to_string(), rendered);
    }

    for (name, node) in &extras.children {
        if !node.whole || name == WILDCARD || out.contains_key(name) {
            continue;
        }
        let value = if let Some(def) = schema.field(name) {
            render(&record.read(def), None, &PathTree::default(), include_nulls)
        } else if let Some(resolve) = schema.extra(name) {
            resolve(record)
        } else {
            tracing::debug!(record = %schema.name(), extra = %name, "unknown extra field");
            continue;
        };
        out.insert(name.clone(), value);
    }

    out
}

fn render(value: &Value, allow: Option<&PathTree>, extras: &PathTree, include_nulls: bool) -> Value {
    match value {
        Value::Record(nested) => Value::Object(project_level(nested, allow, extras, include_nulls)),
        Value::Object(map) => {
            let mut out = IndexMap::new();
            for (key, item) in map {
                let item = match select(allow, key) {
                    Selection::All => render(item, None, &PathTree::default(), include_nulls),
                    Selection::Partial(sub) => render(item, Some(&sub), &PathTree::default(), include_nulls),
                    Selection::Excluded => continue,
                };
                out.insert(key.clone(), item);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render(item, None, &PathTree::default(), include_nulls))
                .collect(),
        ),
        other => other.clone(),
    }
}
