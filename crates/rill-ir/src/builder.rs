//! IR construction: transform, reference resolution, ref-only lifting.

use std::collections::HashMap;
use std::fmt;

use rill_parse::{AstNode, EmptyHint, NodeArena, NodeId, Severity};

use crate::coerce::coerce_scalar;
use crate::value::{Object, Value};

/// A problem found while building the IR, addressed by key path.
#[derive(Debug, Clone, PartialEq)]
pub struct IrDiagnostic {
    /// Human-readable description.
    pub message: String,
    /// Severity class.
    pub severity: Severity,
    /// Path components: key names, or `[i]` for array indices.
    pub path: Vec<String>,
}

impl fmt::Display for IrDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.path.join("."))
    }
}

/// The output of an IR build.
#[derive(Debug, Clone)]
pub struct IrBuild {
    /// The document value; `{}` for an empty document.
    pub value: Value,
    /// Snapshot of the identifier registry built during this pass.
    pub registry: HashMap<String, Value>,
    /// Identifiers referenced but never registered, in walk order.
    pub unresolved_refs: Vec<String>,
    /// Diagnostics found while building.
    pub errors: Vec<IrDiagnostic>,
}

/// Walks a parse tree into an [`IrBuild`].
///
/// Each build starts from a clean registry; results are snapshots, not
/// long-lived handles.
pub struct IrBuilder<'a> {
    arena: &'a NodeArena,
    registry: HashMap<String, Value>,
    unresolved: Vec<String>,
    errors: Vec<IrDiagnostic>,
    path: Vec<String>,
}

impl<'a> IrBuilder<'a> {
    /// Build the IR for `root`, or `{}` when there is no root.
    pub fn build(arena: &'a NodeArena, root: Option<NodeId>) -> IrBuild {
        let mut builder = IrBuilder {
            arena,
            registry: HashMap::new(),
            unresolved: Vec::new(),
            errors: Vec::new(),
            path: Vec::new(),
        };

        let mut value = match root {
            Some(root) => builder.transform(root),
            None => Value::Null,
        };
        if value.is_null() {
            value = Value::empty_object();
        }
        builder.resolve(&mut value);
        let value = lift(value);

        IrBuild {
            value,
            registry: builder.registry,
            unresolved_refs: builder.unresolved,
            errors: builder.errors,
        }
    }

    /// Pass 1: recursive descent from AST to values, registering ids.
    fn transform(&mut self, id: NodeId) -> Value {
        match self.arena.get(id) {
            AstNode::Scalar { value, quoted, .. } => coerce_scalar(value, *quoted),
            AstNode::Mapping { entries, .. } => {
                let mut object = Object::new();
                for entry in entries {
                    self.path.push(entry.key.clone());
                    let value = self.transform(entry.value);
                    self.path.pop();
                    if object.contains_key(&entry.key) {
                        let mut path = self.path.clone();
                        path.push(entry.key.clone());
                        self.errors.push(IrDiagnostic {
                            message: format!("duplicate key `{}`", entry.key),
                            severity: Severity::Warning,
                            path,
                        });
                    }
                    object.insert(entry.key.clone(), value);
                }
                // Register the object, minus its id entry, so inlined
                // copies do not duplicate the identifier.
                if let Some(Value::String(id_value)) = object.get("id") {
                    let id_value = id_value.clone();
                    let mut snapshot = object.clone();
                    snapshot.remove("id");
                    self.registry.insert(id_value, Value::Object(snapshot));
                }
                Value::Object(object)
            }
            AstNode::Sequence { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push(format!("[{}]", index));
                    values.push(self.transform(*item));
                    self.path.pop();
                }
                Value::Array(values)
            }
            AstNode::Ref { target, .. } => Value::Ref(target.clone()),
            AstNode::Empty { hint, .. } => match hint {
                EmptyHint::Mapping => Value::empty_object(),
                EmptyHint::Sequence => Value::empty_array(),
            },
        }
    }

    /// Pass 2: inline registered values over reference sentinels and over
    /// bare array items that name a registered id.
    ///
    /// A freshly inlined copy is never descended into, so resolution
    /// terminates on any input, including self-reference.
    fn resolve(&mut self, value: &mut Value) {
        match value {
            Value::Ref(target) => {
                let found = self.registry.get(target.as_str()).cloned();
                match found {
                    Some(replacement) => *value = replacement,
                    None => self.unresolved.push(target.clone()),
                }
            }
            Value::Object(object) => {
                for (_, entry) in object.iter_mut() {
                    self.resolve(entry);
                }
            }
            Value::Array(items) => {
                for item in items {
                    let replacement = match item {
                        Value::String(name) => self.registry.get(name.as_str()).cloned(),
                        _ => None,
                    };
                    match replacement {
                        Some(found) => *item = found,
                        None => self.resolve(item),
                    }
                }
            }
            _ => {}
        }
    }
}

/// Pass 3: replace every mapping whose sole entry is `ref` by that entry's
/// value, recursively. Idempotent.
fn lift(value: Value) -> Value {
    match value {
        Value::Object(object) => {
            if object.len() == 1 && object.contains_key("ref") {
                let (_, inner) = object.into_entries().pop().unwrap();
                lift(inner)
            } else {
                Value::Object(
                    object
                        .into_entries()
                        .into_iter()
                        .map(|(key, value)| (key, lift(value)))
                        .collect(),
                )
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(lift).collect()),
        other => other,
    }
}
