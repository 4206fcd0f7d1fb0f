//! Persistence orchestrator - the save/find/delete entry points
//!
//! The `Mapper` owns the storage handle and the class registry, enforces the
//! identity and referential-integrity invariants, and wires the statement
//! codec, query resolver and bucket reconstructor together. All blocking
//! happens at storage calls; everything around them is pure computation.

use crate::bucket::bucket_statements;
use crate::codec;
use crate::entity::{AttrValue, Entity, LazyRef, LinkTarget};
use crate::query::{self, Filter, Query};
use crate::schema::{ClassRegistry, ClassSchema, IdentityMode};
use crate::storage::{StatementFilter, StoreStats, TripleStore};
use crate::uri::SubjectUri;
use crate::value::Value;
use crate::{Error, Result};

/// The mapping engine's public surface: saves, finds and deletes entities
/// against a storage backend handle held at construction (no ambient
/// global session).
pub struct Mapper {
    store: TripleStore,
    registry: ClassRegistry,
}

impl Mapper {
    /// Wrap a storage handle and a fully-populated class registry.
    ///
    /// Register every class before constructing the mapper; the registry is
    /// read-only from here on.
    pub fn new(store: TripleStore, registry: ClassRegistry) -> Self {
        Self { store, registry }
    }

    /// The class registry this mapper resolves types against
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Statement counts from the underlying store
    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    // ========== Save ==========

    /// Encode an entity into statements and write them with replace
    /// semantics, predicate by predicate in declaration order.
    ///
    /// A backend-assigned identity is allocated on first save and written
    /// back into the entity; later saves reuse it, so re-saving updates the
    /// same subject. The statement batch is not atomic: a failure partway
    /// leaves earlier predicates' writes in the open session.
    pub fn save(&mut self, entity: &mut Entity) -> Result<()> {
        let schema = self
            .registry
            .resolve_type_by_name(entity.type_name())
            .ok_or_else(|| Error::UnregisteredType(entity.type_name().to_string()))?;

        let identity = match codec::identity_value(schema, entity)? {
            Some(value) => value,
            None => match schema.identity_mode() {
                Some(IdentityMode::BackendAssigned) => {
                    let id = self.store.next_identity()?;
                    Value::Int(id)
                }
                _ => return Err(Error::MissingIdentity(entity.type_name().to_string())),
            },
        };
        if schema.identity_is_backend_assigned() {
            if let Some(id_pred) = schema.identity_predicate() {
                entity.set(id_pred, AttrValue::Literal(identity.clone()));
            }
        }

        let subject = SubjectUri::classify(schema.type_name(), identity.to_text());
        let encoded = codec::encode(&self.registry, schema, entity, &subject)?;
        tracing::debug!(subject = %subject, statements = encoded.len(), "saving entity");

        for group in &encoded.predicates {
            let filter = StatementFilter::any()
                .subject_is(subject.to_uri_string())
                .predicate_is(group.predicate.clone());
            self.store.delete_links(&filter)?;
            self.store.delete_literals(&filter)?;
            for row in &group.links {
                self.store.insert_link(row)?;
            }
            for row in &group.literals {
                self.store.insert_literal(row)?;
            }
        }
        self.store.commit()?;
        entity.mark_persisted(true);
        Ok(())
    }

    // ========== Find ==========

    /// Retrieve all entities of a type matching an optional attribute
    /// filter. Every returned entity is marked persisted; link attributes
    /// stay unresolved until explicitly resolved.
    pub fn find(&self, type_name: &str, filter: Option<Filter>) -> Result<Vec<Entity>> {
        let schema = self
            .registry
            .resolve_type_by_name(type_name)
            .ok_or_else(|| Error::UnregisteredType(type_name.to_string()))?;
        let query = build_query(schema, filter);
        self.run_query(schema, &query)
    }

    /// Like [`find`](Self::find), returning only the first match
    pub fn find_first(&self, type_name: &str, filter: Option<Filter>) -> Result<Option<Entity>> {
        Ok(self.find(type_name, filter)?.into_iter().next())
    }

    /// Retrieve one entity by its identity value.
    ///
    /// `id` is either the raw identity text or, when `is_full_uri` is set,
    /// the complete `<type>/<raw-id>` subject URI.
    pub fn find_by_identity(
        &self,
        type_name: &str,
        id: &str,
        is_full_uri: bool,
    ) -> Result<Option<Entity>> {
        let schema = self
            .registry
            .resolve_type_by_name(type_name)
            .ok_or_else(|| Error::UnregisteredType(type_name.to_string()))?;
        let Some(id_pred) = schema.identity_predicate() else {
            return Err(Error::NoIdentityPredicateDeclared(type_name.to_string()));
        };

        let subject = if is_full_uri {
            SubjectUri::parse(id)?
        } else {
            SubjectUri::classify(schema.type_name(), id)
        };

        let query = if schema.identity_is_backend_assigned() {
            Query::BySubject(subject)
        } else {
            // Caller-assigned identities are stored as ordinary literals.
            let mut pairs = Filter::new();
            pairs.insert(id_pred.to_string(), Value::Text(subject.raw_id));
            Query::ByAttributes(pairs)
        };
        Ok(self.run_query(schema, &query)?.into_iter().next())
    }

    fn run_query(&self, schema: &ClassSchema, query: &Query) -> Result<Vec<Entity>> {
        let (links, literals) = query::resolve(&self.store, schema.type_name(), query)?;
        let buckets = bucket_statements(&links, &literals);
        tracing::debug!(
            type_name = schema.type_name(),
            subjects = buckets.len(),
            "reconstructing entities"
        );

        let mut entities = Vec::with_capacity(buckets.len());
        for (subject, bucket) in &buckets {
            let mut entity = codec::decode(schema, subject, bucket)?;
            entity.mark_persisted(true);
            entities.push(entity);
        }
        Ok(entities)
    }

    // ========== Delete ==========

    /// Remove an entity's statements from both tables.
    ///
    /// Refuses while any link statement still targets the subject - no
    /// cascading deletes. The in-memory entity stays valid but unsaved.
    pub fn delete(&mut self, entity: &mut Entity) -> Result<()> {
        let schema = self
            .registry
            .resolve_type_by_name(entity.type_name())
            .ok_or_else(|| Error::UnregisteredType(entity.type_name().to_string()))?;
        let identity = codec::identity_value(schema, entity)?
            .ok_or_else(|| Error::NoIdentityAssigned(entity.type_name().to_string()))?;
        let subject = SubjectUri::classify(schema.type_name(), identity.to_text());
        let subject_text = subject.to_uri_string();

        let referenced = self
            .store
            .count_links(&StatementFilter::any().object_is(subject_text.clone()))?;
        if referenced > 0 {
            return Err(Error::ReferencedElsewhere(subject_text));
        }

        tracing::debug!(subject = %subject, "deleting entity statements");
        let filter = StatementFilter::any().subject_is(subject_text);
        self.store.delete_links(&filter)?;
        self.store.delete_literals(&filter)?;
        self.store.commit()?;
        entity.mark_persisted(false);
        Ok(())
    }

    // ========== Lazy Resolution ==========

    /// Resolve a lazy reference to its target entity.
    ///
    /// The reference's type hint is looked up in the registry
    /// (`UnresolvableReferenceType` when absent); a missing target row set
    /// yields `None`. Nothing is cached - each call re-queries.
    pub fn resolve_reference(&self, lazy: &LazyRef) -> Result<Option<Entity>> {
        let schema = self
            .registry
            .resolve_type_by_name(&lazy.type_hint)
            .ok_or_else(|| Error::UnresolvableReferenceType(lazy.type_hint.clone()))?;
        self.find_by_identity(schema.type_name(), &lazy.uri.to_uri_string(), true)
    }

    /// Resolve a link target, loaded or deferred, to an entity
    pub fn resolve_link(&self, target: &LinkTarget) -> Result<Option<Entity>> {
        match target {
            LinkTarget::Resolved(entity) => Ok(Some((**entity).clone())),
            LinkTarget::Unresolved(lazy) => self.resolve_reference(lazy),
        }
    }

    /// Read an attribute with every link in it resolved.
    ///
    /// An absent scalar target yields `None`; absent list elements are
    /// omitted. Literals pass through untouched.
    pub fn resolve_attribute(&self, entity: &Entity, predicate: &str) -> Result<Option<AttrValue>> {
        let Some(value) = entity.get(predicate) else {
            return Ok(None);
        };
        match value {
            AttrValue::Link(target) => Ok(self
                .resolve_link(target)?
                .map(|e| AttrValue::Link(LinkTarget::Resolved(Box::new(e))))),
            AttrValue::List(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        AttrValue::Link(target) => {
                            if let Some(e) = self.resolve_link(target)? {
                                resolved.push(AttrValue::Link(LinkTarget::Resolved(Box::new(e))));
                            }
                        }
                        other => resolved.push(other.clone()),
                    }
                }
                Ok(Some(AttrValue::List(resolved)))
            }
            other => Ok(Some(other.clone())),
        }
    }
}

/// Pick the query branch for a find.
///
/// A filter naming the backend-assigned identity predicate already pins the
/// subject, so it skips attribute expansion entirely.
fn build_query(schema: &ClassSchema, filter: Option<Filter>) -> Query {
    match filter {
        None => Query::All,
        Some(pairs) if pairs.is_empty() => Query::All,
        Some(pairs) => {
            if schema.identity_is_backend_assigned() {
                if let Some(id_pred) = schema.identity_predicate() {
                    if let Some(value) = pairs.get(id_pred) {
                        return Query::BySubject(SubjectUri::classify(
                            schema.type_name(),
                            value.to_text(),
                        ));
                    }
                }
            }
            Query::ByAttributes(pairs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ClassSchema;
    use crate::value::Value;

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register(
            ClassSchema::new("Person")
                .identity("id", IdentityMode::BackendAssigned)
                .literal("name")
                .literal("age")
                .literal_list("tags")
                .link("manager"),
        );
        registry.register(
            ClassSchema::new("Account")
                .identity("number", IdentityMode::CallerAssigned)
                .literal("balance"),
        );
        registry.register(ClassSchema::new("Note").literal("body"));
        registry
    }

    fn mapper() -> Mapper {
        Mapper::new(TripleStore::open_in_memory().unwrap(), registry())
    }

    fn person(name: &str, age: i64) -> Entity {
        let mut entity = Entity::new("Person");
        entity.set("name", name);
        entity.set("age", age);
        entity
    }

    fn one_filter(predicate: &str, value: Value) -> Option<Filter> {
        let mut pairs = Filter::new();
        pairs.insert(predicate.to_string(), value);
        Some(pairs)
    }

    #[test]
    fn test_save_allocates_backend_identity_once() {
        let mut mapper = mapper();
        let mut john = person("John", 30);
        mapper.save(&mut john).unwrap();
        assert!(john.is_persisted());

        let first_id = john.get("id").cloned().unwrap();
        john.set("age", 31i64);
        mapper.save(&mut john).unwrap();
        assert_eq!(john.get("id"), Some(&first_id));

        // One subject, not two.
        assert_eq!(mapper.find("Person", None).unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_find_roundtrip() {
        let mut mapper = mapper();
        let mut john = person("John", 30);
        john.set(
            "tags",
            vec![AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("c")],
        );
        mapper.save(&mut john).unwrap();

        let found = mapper.find_first("Person", None).unwrap().unwrap();
        assert!(found.is_persisted());
        assert_eq!(found.get("name"), john.get("name"));
        assert_eq!(found.get("age"), john.get("age"));
        assert_eq!(found.get("id"), john.get("id"));

        // List multiplicity survives; order is unspecified.
        match found.get("tags") {
            Some(AttrValue::List(items)) => {
                let mut texts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        AttrValue::Literal(v) => v.to_text(),
                        other => panic!("expected literal element, got {other:?}"),
                    })
                    .collect();
                texts.sort();
                assert_eq!(texts, ["a", "b", "c"]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_list_predicate_produces_one_row_per_element() {
        let mut mapper = mapper();
        let mut john = person("John", 30);
        john.set(
            "tags",
            vec![AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("c")],
        );
        mapper.save(&mut john).unwrap();

        let stats = mapper.stats().unwrap();
        // name + age + 3 tags
        assert_eq!(stats.literals, 5);
    }

    #[test]
    fn test_replace_semantics_keep_one_row_per_scalar() {
        let mut mapper = mapper();
        let mut john = person("John", 30);
        mapper.save(&mut john).unwrap();

        john.set("age", 31i64);
        mapper.save(&mut john).unwrap();

        let found = mapper.find_first("Person", None).unwrap().unwrap();
        assert_eq!(found.get("age"), Some(&AttrValue::Literal(Value::Int(31))));
        // Two scalar literals only: name and the replaced age.
        assert_eq!(mapper.stats().unwrap().literals, 2);
    }

    #[test]
    fn test_query_expansion_returns_whole_objects() {
        let mut mapper = mapper();
        mapper.save(&mut person("John", 30)).unwrap();
        mapper.save(&mut person("Jane", 25)).unwrap();

        let results = mapper
            .find("Person", one_filter("name", Value::Text("John".into())))
            .unwrap();
        assert_eq!(results.len(), 1);
        // The age attribute came along even though only name was filtered.
        assert_eq!(results[0].get("age"), Some(&AttrValue::Literal(Value::Int(30))));
    }

    #[test]
    fn test_empty_filter_behaves_like_no_filter() {
        let mut mapper = mapper();
        mapper.save(&mut person("John", 30)).unwrap();
        mapper.save(&mut person("Jane", 25)).unwrap();

        let results = mapper.find("Person", Some(Filter::new())).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_find_by_backend_identity_filter_takes_subject_branch() {
        let mut mapper = mapper();
        let mut john = person("John", 30);
        mapper.save(&mut john).unwrap();
        let Some(AttrValue::Literal(id)) = john.get("id").cloned() else {
            panic!("identity not assigned");
        };

        let found = mapper.find("Person", one_filter("id", id)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&AttrValue::Literal(Value::Text("John".into()))));
    }

    #[test]
    fn test_find_by_identity_raw_and_full() {
        let mut mapper = mapper();
        let mut john = person("John", 30);
        mapper.save(&mut john).unwrap();
        let Some(AttrValue::Literal(id)) = john.get("id").cloned() else {
            panic!("identity not assigned");
        };
        let raw = id.to_text();

        let by_raw = mapper.find_by_identity("Person", &raw, false).unwrap();
        assert!(by_raw.is_some());

        let by_full = mapper
            .find_by_identity("Person", &format!("person/{raw}"), true)
            .unwrap();
        assert!(by_full.is_some());

        let missing = mapper.find_by_identity("Person", "999999", false).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_find_by_identity_caller_assigned() {
        let mut mapper = mapper();
        let mut account = Entity::new("Account");
        account.set("number", "ACC-1");
        account.set("balance", 100i64);
        mapper.save(&mut account).unwrap();

        let found = mapper.find_by_identity("Account", "ACC-1", false).unwrap().unwrap();
        assert_eq!(found.get("balance"), Some(&AttrValue::Literal(Value::Int(100))));
    }

    #[test]
    fn test_find_by_identity_without_identity_predicate() {
        let mapper = mapper();
        let err = mapper.find_by_identity("Note", "1", false).unwrap_err();
        assert!(matches!(err, Error::NoIdentityPredicateDeclared(t) if t == "Note"));
    }

    #[test]
    fn test_save_without_identity() {
        let mut mapper = mapper();
        let mut account = Entity::new("Account");
        account.set("balance", 100i64);
        let err = mapper.save(&mut account).unwrap_err();
        assert!(matches!(err, Error::MissingIdentity(_)));
        assert!(!account.is_persisted());
    }

    #[test]
    fn test_save_rejects_list_identity() {
        let mut mapper = mapper();
        let mut account = Entity::new("Account");
        account.set("number", vec![AttrValue::from("a"), AttrValue::from("b")]);
        let err = mapper.save(&mut account).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentity(_)));
    }

    #[test]
    fn test_save_rejects_unpersisted_link_target() {
        let mut mapper = mapper();
        let mut boss = person("Boss", 50);
        boss.set("id", 99i64); // identity present but never saved

        let mut john = person("John", 30);
        john.set("manager", boss);
        let err = mapper.save(&mut john).unwrap_err();
        assert!(matches!(err, Error::ReferencedObjectNotPersisted(p) if p == "manager"));
    }

    #[test]
    fn test_referential_integrity_on_delete() {
        let mut mapper = mapper();
        let mut boss = person("Boss", 50);
        mapper.save(&mut boss).unwrap();

        let mut john = person("John", 30);
        john.set("manager", boss.clone());
        mapper.save(&mut john).unwrap();

        // Boss is still referenced by John's manager link.
        let err = mapper.delete(&mut boss).unwrap_err();
        assert!(matches!(err, Error::ReferencedElsewhere(_)));
        assert!(boss.is_persisted());

        // Deleting the referrer first unblocks the target.
        mapper.delete(&mut john).unwrap();
        mapper.delete(&mut boss).unwrap();
        assert!(!boss.is_persisted());
        assert_eq!(mapper.stats().unwrap().literals, 0);
    }

    #[test]
    fn test_delete_without_identity() {
        let mut mapper = mapper();
        let mut account = Entity::new("Account");
        let err = mapper.delete(&mut account).unwrap_err();
        assert!(matches!(err, Error::NoIdentityAssigned(_)));
    }

    #[test]
    fn test_lazy_reference_resolution() {
        let mut mapper = mapper();
        let mut boss = person("Boss", 50);
        mapper.save(&mut boss).unwrap();
        let mut john = person("John", 30);
        john.set("manager", boss);
        mapper.save(&mut john).unwrap();

        let found = mapper
            .find_first("Person", one_filter("name", Value::Text("John".into())))
            .unwrap()
            .unwrap();
        // The link comes back unresolved.
        assert!(matches!(
            found.get("manager"),
            Some(AttrValue::Link(LinkTarget::Unresolved(_)))
        ));

        let resolved = mapper.resolve_attribute(&found, "manager").unwrap().unwrap();
        match resolved {
            AttrValue::Link(LinkTarget::Resolved(entity)) => {
                assert_eq!(
                    entity.get("name"),
                    Some(&AttrValue::Literal(Value::Text("Boss".into())))
                );
            }
            other => panic!("expected resolved link, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_tolerates_absent_target() {
        let mapper = mapper();
        let lazy = LazyRef::new(SubjectUri::parse("person/424242").unwrap());
        assert!(mapper.resolve_reference(&lazy).unwrap().is_none());
    }

    #[test]
    fn test_resolution_rejects_unknown_type_hint() {
        let mapper = mapper();
        let lazy = LazyRef::new(SubjectUri::parse("starship/1").unwrap());
        let err = mapper.resolve_reference(&lazy).unwrap_err();
        assert!(matches!(err, Error::UnresolvableReferenceType(t) if t == "Starship"));
    }

    #[test]
    fn test_unregistered_type() {
        let mut mapper = mapper();
        let mut entity = Entity::new("Ghost");
        assert!(matches!(mapper.save(&mut entity), Err(Error::UnregisteredType(_))));
        assert!(matches!(mapper.find("Ghost", None), Err(Error::UnregisteredType(_))));
    }
}
