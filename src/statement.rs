//! Statement types - the two row forms of the triple store
//!
//! Every object attribute decomposes into statements of one of two shapes:
//! - `LinkStatement`: the object is a reference to another mapped subject
//! - `LiteralStatement`: the object is a primitive value tagged with its kind
//!
//! Multiplicity is represented as multiple statements sharing the same
//! subject and predicate, never as a serialized list value.

use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A statement whose object is a reference to another mapped subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkStatement {
    /// Subject URI in `<type>/<raw-id>` form
    pub subject: String,
    /// Predicate (attribute) name
    pub predicate: String,
    /// Target subject URI
    pub object: String,
}

impl LinkStatement {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for LinkStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subject:{}, Predicate:{}, Object:{}",
            self.subject, self.predicate, self.object
        )
    }
}

/// A statement whose object is a primitive value, text-serialized and
/// tagged with the kind used to parse it back during decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiteralStatement {
    /// Subject URI in `<type>/<raw-id>` form
    pub subject: String,
    /// Predicate (attribute) name
    pub predicate: String,
    /// Kind tag for the stored value
    pub kind: ValueKind,
    /// Canonical text form of the value
    pub value: String,
}

impl LiteralStatement {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        kind: ValueKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            kind,
            value: value.into(),
        }
    }
}

impl fmt::Display for LiteralStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subject:{}, Predicate:{}, Kind:{}, Value:{}",
            self.subject, self.predicate, self.kind, self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_display() {
        let stmt = LinkStatement::new("person/1", "manager", "person/2");
        assert_eq!(
            stmt.to_string(),
            "Subject:person/1, Predicate:manager, Object:person/2"
        );
    }

    #[test]
    fn test_literal_display() {
        let stmt = LiteralStatement::new("person/1", "age", ValueKind::Int, "30");
        assert_eq!(
            stmt.to_string(),
            "Subject:person/1, Predicate:age, Kind:int, Value:30"
        );
    }
}
