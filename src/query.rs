//! Query resolution - from attribute filters to complete statement sets
//!
//! Two branches. An identity lookup scopes by exact subject, which already
//! yields the whole object. The general attribute lookup runs in two phases:
//! find the statement rows matching every filter pair, then re-fetch the
//! complete statement set of every subject that appeared in the match - a
//! query naming one attribute must still retrieve whole objects.

use crate::statement::{LinkStatement, LiteralStatement};
use crate::storage::{StatementFilter, TripleStore};
use crate::uri::SubjectUri;
use crate::value::Value;
use crate::Result;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// An attribute/value filter: predicate name to expected value, matched
/// conjunctively across all pairs.
pub type Filter = BTreeMap<String, Value>;

/// A resolved query form.
#[derive(Debug, Clone)]
pub enum Query {
    /// Every statement of the type's namespace
    All,
    /// Every statement of one exact subject
    BySubject(SubjectUri),
    /// Statements matching an attribute filter, expanded to whole subjects
    ByAttributes(Filter),
}

/// Fetch the statement rows answering a query over one type's namespace.
///
/// Rows come back grouped by subject in ascending subject order; no other
/// ordering is guaranteed across calls.
pub fn resolve(
    store: &TripleStore,
    type_name: &str,
    query: &Query,
) -> Result<(Vec<LinkStatement>, Vec<LiteralStatement>)> {
    let prefix = format!("{}/", type_name.to_lowercase());

    match query {
        Query::All => {
            let filter = StatementFilter::any().subject_starts_with(prefix);
            Ok((store.query_links(&filter)?, store.query_literals(&filter)?))
        }
        Query::BySubject(subject) => fetch_subject(store, &subject.to_uri_string()),
        Query::ByAttributes(pairs) => {
            let subjects = matching_subjects(store, &prefix, pairs)?;
            let mut links = Vec::new();
            let mut literals = Vec::new();
            for subject in subjects {
                let (subject_links, subject_literals) = fetch_subject(store, &subject)?;
                links.extend(subject_links);
                literals.extend(subject_literals);
            }
            Ok((links, literals))
        }
    }
}

/// Complete, unfiltered statement set of one subject, from both tables
fn fetch_subject(
    store: &TripleStore,
    subject: &str,
) -> Result<(Vec<LinkStatement>, Vec<LiteralStatement>)> {
    let filter = StatementFilter::any().subject_is(subject);
    Ok((store.query_links(&filter)?, store.query_literals(&filter)?))
}

/// Phase one: the distinct subjects whose statements match every filter
/// pair. Each pair constrains the same row, so pairs are intersected; a
/// value can match either the links or the literals table.
fn matching_subjects(store: &TripleStore, prefix: &str, pairs: &Filter) -> Result<BTreeSet<String>> {
    let mut matched_links: Option<HashSet<LinkStatement>> = None;
    let mut matched_literals: Option<HashSet<LiteralStatement>> = None;

    for (predicate, value) in pairs {
        let filter = StatementFilter::any()
            .subject_starts_with(prefix)
            .predicate_is(predicate.clone())
            .object_is(value.to_text());

        let links: HashSet<_> = store.query_links(&filter)?.into_iter().collect();
        matched_links = Some(match matched_links {
            Some(prev) => prev.intersection(&links).cloned().collect(),
            None => links,
        });

        let literals: HashSet<_> = store.query_literals(&filter)?.into_iter().collect();
        matched_literals = Some(match matched_literals {
            Some(prev) => prev.intersection(&literals).cloned().collect(),
            None => literals,
        });
    }

    let mut subjects = BTreeSet::new();
    for row in matched_links.unwrap_or_default() {
        subjects.insert(row.subject);
    }
    for row in matched_literals.unwrap_or_default() {
        subjects.insert(row.subject);
    }
    Ok(subjects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn seeded_store() -> TripleStore {
        let mut store = TripleStore::open_in_memory().unwrap();
        for (subject, name, age) in [("person/1", "John", "30"), ("person/2", "Jane", "25")] {
            store
                .insert_literal(&LiteralStatement::new(subject, "name", ValueKind::Text, name))
                .unwrap();
            store
                .insert_literal(&LiteralStatement::new(subject, "age", ValueKind::Int, age))
                .unwrap();
        }
        store
            .insert_link(&LinkStatement::new("person/1", "manager", "person/2"))
            .unwrap();
        store
            .insert_literal(&LiteralStatement::new("robot/1", "name", ValueKind::Text, "R2"))
            .unwrap();
        store.commit().unwrap();
        store
    }

    fn filter(pairs: &[(&str, Value)]) -> Filter {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_all_scopes_to_type_namespace() {
        let store = seeded_store();
        let (links, literals) = resolve(&store, "Person", &Query::All).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(literals.len(), 4);
        assert!(literals.iter().all(|row| row.subject.starts_with("person/")));
    }

    #[test]
    fn test_by_subject_is_complete() {
        let store = seeded_store();
        let subject = SubjectUri::parse("person/1").unwrap();
        let (links, literals) = resolve(&store, "Person", &Query::BySubject(subject)).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(literals.len(), 2);
    }

    #[test]
    fn test_attribute_match_expands_to_whole_object() {
        let store = seeded_store();
        let query = Query::ByAttributes(filter(&[("name", Value::Text("John".into()))]));
        let (links, literals) = resolve(&store, "Person", &query).unwrap();

        // The name row matched, and the expansion pulled age and manager too.
        assert_eq!(literals.len(), 2);
        assert_eq!(links.len(), 1);
        assert!(literals.iter().all(|row| row.subject == "person/1"));
    }

    #[test]
    fn test_attribute_match_on_link_value() {
        let store = seeded_store();
        let query = Query::ByAttributes(filter(&[("manager", Value::Text("person/2".into()))]));
        let (links, literals) = resolve(&store, "Person", &query).unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(literals.len(), 2);
        assert!(links.iter().all(|row| row.subject == "person/1"));
    }

    #[test]
    fn test_no_match_yields_nothing() {
        let store = seeded_store();
        let query = Query::ByAttributes(filter(&[("name", Value::Text("Nobody".into()))]));
        let (links, literals) = resolve(&store, "Person", &query).unwrap();
        assert!(links.is_empty());
        assert!(literals.is_empty());
    }

    #[test]
    fn test_pairs_on_distinct_predicates_constrain_the_same_row() {
        let store = seeded_store();
        // No single statement row carries both pairs, so the conjunction is empty.
        let query = Query::ByAttributes(filter(&[
            ("name", Value::Text("John".into())),
            ("age", Value::Int(30)),
        ]));
        let (links, literals) = resolve(&store, "Person", &query).unwrap();
        assert!(links.is_empty());
        assert!(literals.is_empty());
    }

    #[test]
    fn test_rows_sorted_by_subject() {
        let store = seeded_store();
        let (_, literals) = resolve(&store, "Person", &Query::All).unwrap();
        let subjects: Vec<_> = literals.iter().map(|row| row.subject.clone()).collect();
        let mut sorted = subjects.clone();
        sorted.sort();
        assert_eq!(subjects, sorted);
    }
}
