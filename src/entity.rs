//! Entity - the in-memory form of a mapped object
//!
//! An `Entity` is a record of a registered class: a type name, an attribute
//! map keyed by predicate name, and a persistence flag. Link attributes are
//! explicit `LinkTarget` variants - either an in-memory `Resolved` entity or
//! an `Unresolved` lazy reference produced by decode, which stays a
//! placeholder until the caller asks the mapper to resolve it.

use crate::uri::SubjectUri;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder for a link target that has not been loaded.
///
/// Holds the target's URI and a type-name hint derived from the URI's type
/// segment (capitalized, to match registered type names). Not ownership -
/// purely a deferred retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LazyRef {
    /// Full subject URI of the referenced object
    pub uri: SubjectUri,
    /// Registered-type-name hint, e.g. `Person` for a `person/7` target
    pub type_hint: String,
}

impl LazyRef {
    /// Build a lazy reference from a target URI
    pub fn new(uri: SubjectUri) -> Self {
        let type_hint = capitalize(&uri.type_name);
        Self { uri, type_hint }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A link attribute's target: loaded or deferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkTarget {
    /// An in-memory entity (set by the caller before save, or after an
    /// explicit resolve)
    Resolved(Box<Entity>),
    /// A placeholder produced by decode; resolve through the mapper
    Unresolved(LazyRef),
}

/// An attribute value on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// A primitive value
    Literal(Value),
    /// A reference to another mapped object
    Link(LinkTarget),
    /// Zero or more literal or link values; element order is unspecified
    /// once the value has been through storage
    List(Vec<AttrValue>),
}

impl From<Value> for AttrValue {
    fn from(v: Value) -> Self {
        AttrValue::Literal(v)
    }
}

impl From<Entity> for AttrValue {
    fn from(e: Entity) -> Self {
        AttrValue::Link(LinkTarget::Resolved(Box::new(e)))
    }
}

impl From<LazyRef> for AttrValue {
    fn from(r: LazyRef) -> Self {
        AttrValue::Link(LinkTarget::Unresolved(r))
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(items: Vec<AttrValue>) -> Self {
        AttrValue::List(items)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Literal(Value::Int(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Literal(Value::Float(v))
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Literal(Value::Bool(v))
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Literal(Value::Text(v.to_string()))
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Literal(Value::Text(v))
    }
}

impl From<chrono::NaiveDate> for AttrValue {
    fn from(v: chrono::NaiveDate) -> Self {
        AttrValue::Literal(Value::Date(v))
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Literal(v) => write!(f, "{v}"),
            AttrValue::Link(LinkTarget::Unresolved(r)) => write!(f, "{}", r.uri),
            AttrValue::Link(LinkTarget::Resolved(e)) => write!(f, "<{}>", e.type_name()),
            AttrValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An instance of a registered mapped class.
///
/// Freshly constructed entities are not persisted; a successful save or a
/// find-construction marks them persisted. Any mutation after that clears
/// the flag again until the next save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    type_name: String,
    attrs: BTreeMap<String, AttrValue>,
    persisted: bool,
}

impl Entity {
    /// Create an empty, unsaved entity of the given registered type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attrs: BTreeMap::new(),
            persisted: false,
        }
    }

    /// The registered type name this entity belongs to
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set an attribute. Clears the persisted flag.
    pub fn set(&mut self, predicate: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(predicate.to_string(), value.into());
        self.persisted = false;
    }

    /// Remove an attribute, leaving it unset. Clears the persisted flag.
    pub fn unset(&mut self, predicate: &str) {
        self.attrs.remove(predicate);
        self.persisted = false;
    }

    /// Read an attribute, or `None` when unset
    pub fn get(&self, predicate: &str) -> Option<&AttrValue> {
        self.attrs.get(predicate)
    }

    /// Iterate over the set attributes
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether this entity's statements are known to be in storage
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn mark_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.attrs {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{name}: {value}")?;
            first = false;
        }
        Ok(())
    }
}
