//! Statement codec - translating entities to statement rows and back
//!
//! Encode walks an entity's declared predicates in declaration order and
//! emits link/literal statements; a list attribute becomes one statement per
//! element sharing the subject and predicate. Decode consumes one subject's
//! bucket of raw values and rebuilds a typed entity, leaving link targets as
//! unresolved lazy references.
//!
//! Identity allocation is the orchestrator's job: encode expects the subject
//! URI to be settled already, so both directions stay pure computation.

use crate::bucket::{Bucket, RawValue};
use crate::entity::{AttrValue, Entity, LazyRef, LinkTarget};
use crate::schema::{ClassRegistry, ClassSchema};
use crate::statement::{LinkStatement, LiteralStatement};
use crate::uri::SubjectUri;
use crate::value::Value;
use crate::{Error, Result};

/// All statements of one predicate, kept together so replace semantics can
/// clear a predicate's old rows exactly once before its new rows go in.
#[derive(Debug, Clone)]
pub struct PredicateStatements {
    pub predicate: String,
    pub links: Vec<LinkStatement>,
    pub literals: Vec<LiteralStatement>,
}

/// The encoded form of one entity: its subject plus per-predicate statement
/// groups in attribute-declaration order.
#[derive(Debug, Clone)]
pub struct EncodedEntity {
    pub subject: SubjectUri,
    pub predicates: Vec<PredicateStatements>,
}

impl EncodedEntity {
    /// Total number of statements across all predicates
    pub fn len(&self) -> usize {
        self.predicates
            .iter()
            .map(|p| p.links.len() + p.literals.len())
            .sum()
    }

    /// Whether no statements were produced
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read and validate an entity's identity attribute.
///
/// Returns `None` when the identity is unset (the orchestrator then either
/// allocates one or fails, depending on the identity mode). A list-valued or
/// link-valued identity is rejected outright.
pub fn identity_value(schema: &ClassSchema, entity: &Entity) -> Result<Option<Value>> {
    let Some(id_pred) = schema.identity_predicate() else {
        return Ok(None);
    };
    match entity.get(id_pred) {
        None => Ok(None),
        Some(AttrValue::Literal(v)) => Ok(Some(v.clone())),
        Some(AttrValue::List(_)) | Some(AttrValue::Link(_)) => {
            Err(Error::InvalidIdentity(schema.type_name().to_string()))
        }
    }
}

/// Encode one entity into its statement set.
///
/// The subject must already carry the resolved identity. Unset predicates
/// emit nothing; a backend-assigned identity lives in the subject URI and is
/// likewise not emitted, while a caller-assigned identity is stored as an
/// ordinary literal so identity-filtered finds can match it.
pub fn encode(
    registry: &ClassRegistry,
    schema: &ClassSchema,
    entity: &Entity,
    subject: &SubjectUri,
) -> Result<EncodedEntity> {
    let subject_text = subject.to_uri_string();
    let mut predicates = Vec::new();

    for def in schema.predicates() {
        if schema.identity_predicate() == Some(def.name.as_str())
            && schema.identity_is_backend_assigned()
        {
            continue;
        }
        let Some(value) = entity.get(&def.name) else {
            continue;
        };

        let mut group = PredicateStatements {
            predicate: def.name.clone(),
            links: Vec::new(),
            literals: Vec::new(),
        };
        match value {
            AttrValue::List(items) => {
                for item in items {
                    encode_scalar(registry, &subject_text, &def.name, item, &mut group)?;
                }
            }
            scalar => encode_scalar(registry, &subject_text, &def.name, scalar, &mut group)?,
        }
        predicates.push(group);
    }

    Ok(EncodedEntity {
        subject: subject.clone(),
        predicates,
    })
}

fn encode_scalar(
    registry: &ClassRegistry,
    subject: &str,
    predicate: &str,
    value: &AttrValue,
    group: &mut PredicateStatements,
) -> Result<()> {
    match value {
        AttrValue::Literal(v) => {
            group.literals.push(LiteralStatement::new(
                subject,
                predicate,
                v.kind(),
                v.to_text(),
            ));
        }
        AttrValue::Link(LinkTarget::Resolved(target)) => {
            let object = object_uri(registry, predicate, target)?;
            if !target.is_persisted() {
                return Err(Error::ReferencedObjectNotPersisted(predicate.to_string()));
            }
            group
                .links
                .push(LinkStatement::new(subject, predicate, object.to_uri_string()));
        }
        AttrValue::Link(LinkTarget::Unresolved(lazy)) => {
            // Came out of the store, so the target is persisted by provenance.
            group
                .links
                .push(LinkStatement::new(subject, predicate, lazy.uri.to_uri_string()));
        }
        AttrValue::List(_) => {
            return Err(Error::InvalidValue {
                kind: "list",
                text: format!("nested list under predicate '{predicate}'"),
            });
        }
    }
    Ok(())
}

/// Classified URI of a linked entity, from its own identity attribute.
fn object_uri(registry: &ClassRegistry, predicate: &str, target: &Entity) -> Result<SubjectUri> {
    let schema = registry
        .resolve_type_by_name(target.type_name())
        .ok_or_else(|| Error::UnregisteredType(target.type_name().to_string()))?;
    match identity_value(schema, target)? {
        Some(id) => Ok(SubjectUri::classify(schema.type_name(), id.to_text())),
        None => Err(Error::ReferencedObjectMissingIdentity(predicate.to_string())),
    }
}

/// Decode one subject's bucket into a typed entity.
///
/// Link rows become unresolved lazy references; literal rows are parsed via
/// their kind tag. Declared list predicates normalize a single row to a
/// one-element list. Predicates absent from the schema are skipped. The
/// caller decides the persisted flag.
pub fn decode(schema: &ClassSchema, subject: &str, bucket: &Bucket) -> Result<Entity> {
    let mut entity = Entity::new(schema.type_name());

    for (predicate, slot) in bucket {
        let Some(def) = schema.predicate_def(predicate) else {
            tracing::debug!(subject, predicate = %predicate, "skipping undeclared predicate");
            continue;
        };

        let mut decoded = Vec::with_capacity(slot.values().len());
        for raw in slot.values() {
            decoded.push(decode_raw(raw)?);
        }

        let attr = if decoded.len() > 1 || def.kind.is_list() {
            AttrValue::List(decoded)
        } else {
            match decoded.into_iter().next() {
                Some(single) => single,
                None => continue,
            }
        };
        entity.set(predicate, attr);
    }

    if schema.identity_is_backend_assigned() {
        if let Some(id_pred) = schema.identity_predicate() {
            let raw_id = SubjectUri::parse(subject)?.raw_id;
            // Backend ids are integers; tolerate foreign raw ids as text.
            let id = match raw_id.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Text(raw_id),
            };
            entity.set(id_pred, id);
        }
    }

    Ok(entity)
}

fn decode_raw(raw: &RawValue) -> Result<AttrValue> {
    match raw {
        RawValue::Link(uri_text) => {
            let uri = SubjectUri::parse(uri_text)?;
            Ok(AttrValue::Link(LinkTarget::Unresolved(LazyRef::new(uri))))
        }
        RawValue::Literal { kind, text } => Ok(AttrValue::Literal(Value::parse(*kind, text)?)),
    }
}
