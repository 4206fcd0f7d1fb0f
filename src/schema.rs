//! Class schemas and the process-wide registry
//!
//! Every mapped type declares its attributes as predicates up front: name,
//! shape (scalar/list crossed with literal/link), and at most one identity
//! predicate. The registry maps type names to schemas and is populated once
//! at startup, then read concurrently without locking.

use std::collections::HashMap;

/// Shape of a declared predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    /// Single primitive value
    ScalarLiteral,
    /// Single reference to another mapped subject
    ScalarLink,
    /// Zero or more primitive values
    ListLiteral,
    /// Zero or more references to other mapped subjects
    ListLink,
}

impl PredicateKind {
    /// Whether this predicate decodes to a list
    pub fn is_list(&self) -> bool {
        matches!(self, PredicateKind::ListLiteral | PredicateKind::ListLink)
    }
}

/// How a class's identity value comes into being.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// The caller sets the identity attribute before the first save
    CallerAssigned,
    /// The backend's id allocator assigns an integer at first save
    BackendAssigned,
}

/// A declared predicate of a mapped class.
#[derive(Debug, Clone)]
pub struct PredicateDef {
    pub name: String,
    pub kind: PredicateKind,
}

/// Per-type metadata: declared predicates and the identity predicate.
#[derive(Debug, Clone)]
pub struct ClassSchema {
    type_name: String,
    predicates: Vec<PredicateDef>,
    identity: Option<(String, IdentityMode)>,
}

impl ClassSchema {
    /// Start a schema for the given type name.
    ///
    /// The name is matched exactly by registry lookups and lowercased when
    /// it becomes a URI namespace, so `"Person"` yields `person/...`
    /// subjects.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            predicates: Vec::new(),
            identity: None,
        }
    }

    /// Declare a scalar literal predicate
    pub fn literal(self, name: &str) -> Self {
        self.predicate(name, PredicateKind::ScalarLiteral)
    }

    /// Declare a scalar link predicate
    pub fn link(self, name: &str) -> Self {
        self.predicate(name, PredicateKind::ScalarLink)
    }

    /// Declare a list-of-literals predicate
    pub fn literal_list(self, name: &str) -> Self {
        self.predicate(name, PredicateKind::ListLiteral)
    }

    /// Declare a list-of-links predicate
    pub fn link_list(self, name: &str) -> Self {
        self.predicate(name, PredicateKind::ListLink)
    }

    /// Declare a predicate with an explicit kind
    pub fn predicate(mut self, name: &str, kind: PredicateKind) -> Self {
        self.predicates.push(PredicateDef {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// Mark a declared-or-new scalar literal predicate as the identity.
    ///
    /// A class holds at most one identity predicate; calling this again
    /// replaces the previous designation.
    pub fn identity(mut self, name: &str, mode: IdentityMode) -> Self {
        if !self.predicates.iter().any(|p| p.name == name) {
            self.predicates.push(PredicateDef {
                name: name.to_string(),
                kind: PredicateKind::ScalarLiteral,
            });
        }
        self.identity = Some((name.to_string(), mode));
        self
    }

    /// The exact type name this schema was declared with
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared predicates, in declaration order
    pub fn predicates(&self) -> &[PredicateDef] {
        &self.predicates
    }

    /// Look up a declared predicate by name
    pub fn predicate_def(&self, name: &str) -> Option<&PredicateDef> {
        self.predicates.iter().find(|p| p.name == name)
    }

    /// The identity predicate name, if one is declared
    pub fn identity_predicate(&self) -> Option<&str> {
        self.identity.as_ref().map(|(name, _)| name.as_str())
    }

    /// How the identity is assigned, if an identity is declared
    pub fn identity_mode(&self) -> Option<IdentityMode> {
        self.identity.as_ref().map(|(_, mode)| *mode)
    }

    /// Whether the identity is allocated by the backend
    pub fn identity_is_backend_assigned(&self) -> bool {
        matches!(self.identity_mode(), Some(IdentityMode::BackendAssigned))
    }
}

/// Process-wide registry of mapped classes, keyed by exact type name.
///
/// Populated at startup, before any mapping operation runs; lookups take
/// `&self` and are safe to share across threads once registration is done.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassSchema>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a class schema, replacing any previous schema of the same name
    pub fn register(&mut self, schema: ClassSchema) {
        self.classes.insert(schema.type_name.clone(), schema);
    }

    /// Exact-name lookup. Returns `None` when no such type is registered;
    /// callers decide whether that is fatal.
    pub fn resolve_type_by_name(&self, name: &str) -> Option<&ClassSchema> {
        self.classes.get(name)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes are registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
