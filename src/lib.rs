//! # Triplemap - Relational triple-store object mapper
//!
//! Triplemap decomposes domain objects into flat, order-independent sets of
//! (subject, predicate, object) statements and reconstructs them - lists and
//! cross-object references included - from scattered rows.
//!
//! Triplemap provides:
//! - A namespaced URI identity scheme (`"<type>/<raw-id>"`) for every object
//! - A statement codec between entities and link/literal statement rows
//! - Attribute-level queries expanded into whole-object retrieval
//! - Lazy cross-reference resolution with explicit `resolve` calls
//! - A save/find/delete lifecycle with referential-integrity guards
//! - SQLite-backed statement storage with two tables (links, literals)

pub mod uri;
pub mod value;
pub mod statement;
pub mod schema;
pub mod entity;
pub mod bucket;
pub mod codec;
pub mod query;
pub mod mapper;
pub mod storage;
pub mod config;

// Re-exports for convenient access
pub use uri::SubjectUri;
pub use value::{Value, ValueKind};
pub use statement::{LinkStatement, LiteralStatement};
pub use schema::{ClassRegistry, ClassSchema, IdentityMode, PredicateKind};
pub use entity::{AttrValue, Entity, LazyRef, LinkTarget};
pub use query::{Filter, Query};
pub use mapper::Mapper;
pub use storage::TripleStore;

/// Result type alias for triplemap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for triplemap operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Type not registered: {0}")]
    UnregisteredType(String),

    #[error("Identity value unset for type: {0}")]
    MissingIdentity(String),

    #[error("Identity value cannot be a list: {0}")]
    InvalidIdentity(String),

    #[error("Linked object under predicate '{0}' has not been persisted")]
    ReferencedObjectNotPersisted(String),

    #[error("Linked object under predicate '{0}' has no identity value")]
    ReferencedObjectMissingIdentity(String),

    #[error("Cannot delete object with no identity assigned: {0}")]
    NoIdentityAssigned(String),

    #[error("Cannot delete {0}: it is referenced by another subject")]
    ReferencedElsewhere(String),

    #[error("Reference type cannot be resolved in the registry: {0}")]
    UnresolvableReferenceType(String),

    #[error("Type declares no identity predicate: {0}")]
    NoIdentityPredicateDeclared(String),

    #[error("Unknown value kind tag: {0}")]
    UnknownValueKind(String),

    #[error("Invalid {kind} value: {text}")]
    InvalidValue { kind: &'static str, text: String },
}
