//! SQLite storage implementation

use super::schema;
use crate::statement::{LinkStatement, LiteralStatement};
use crate::value::ValueKind;
use crate::{Error, Result};
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::str::FromStr;

/// Text-matching modes for statement filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// Column equals the given text
    Exact(String),
    /// Column starts with the given text
    Prefix(String),
}

/// A conjunction of equality/prefix predicates over statement columns.
///
/// The `object` constraint matches `object_uri` on the links table and
/// `value` on the literals table, so one filter can be applied to either.
#[derive(Debug, Clone, Default)]
pub struct StatementFilter {
    pub subject: Option<TextMatch>,
    pub predicate: Option<String>,
    pub object: Option<String>,
}

impl StatementFilter {
    /// An unconstrained filter (matches every row)
    pub fn any() -> Self {
        Self::default()
    }

    /// Constrain the subject to an exact URI
    pub fn subject_is(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(TextMatch::Exact(subject.into()));
        self
    }

    /// Constrain the subject to a URI prefix (e.g. `"person/"`)
    pub fn subject_starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.subject = Some(TextMatch::Prefix(prefix.into()));
        self
    }

    /// Constrain the predicate
    pub fn predicate_is(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Constrain the object (link target URI or literal value text)
    pub fn object_is(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Render the WHERE clause and its parameters for the given object column
    fn where_clause(&self, object_column: &str) -> (String, Vec<String>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        match &self.subject {
            Some(TextMatch::Exact(s)) => {
                clauses.push("subject_uri = ?".to_string());
                args.push(s.clone());
            }
            Some(TextMatch::Prefix(p)) => {
                clauses.push("subject_uri LIKE ?".to_string());
                args.push(format!("{p}%"));
            }
            None => {}
        }
        if let Some(p) = &self.predicate {
            clauses.push("predicate = ?".to_string());
            args.push(p.clone());
        }
        if let Some(o) = &self.object {
            clauses.push(format!("{object_column} = ?"));
            args.push(o.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, args)
    }
}

/// SQLite-backed statement store.
///
/// Writes join a lazily-opened session transaction; `commit` closes it.
/// Reads on the same connection observe uncommitted session writes.
pub struct TripleStore {
    conn: Connection,
    in_txn: bool,
}

impl TripleStore {
    /// Open a database file (creates if it doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn, in_txn: false };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, in_txn: false };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Identity Allocation ==========

    /// Reserve the next backend-assigned identity.
    ///
    /// Monotonically increasing and never handed out twice; the reservation
    /// joins the open session transaction.
    pub fn next_identity(&mut self) -> Result<i64> {
        self.begin_if_needed()?;
        let id: i64 = self.conn.query_row(
            r#"
            INSERT INTO id_sequence (name, next) VALUES ('subject_id', 1)
            ON CONFLICT(name) DO UPDATE SET next = next + 1
            RETURNING next
            "#,
            [],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // ========== Link Operations ==========

    /// Query link rows, ordered by subject for stable bucketing
    pub fn query_links(&self, filter: &StatementFilter) -> Result<Vec<LinkStatement>> {
        let (where_sql, args) = filter.where_clause("object_uri");
        let sql = format!(
            "SELECT subject_uri, predicate, object_uri FROM links{where_sql} ORDER BY subject_uri"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(LinkStatement {
                    subject: row.get(0)?,
                    predicate: row.get(1)?,
                    object: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Insert a link row
    pub fn insert_link(&mut self, statement: &LinkStatement) -> Result<()> {
        self.begin_if_needed()?;
        self.conn.execute(
            "INSERT INTO links (subject_uri, predicate, object_uri) VALUES (?1, ?2, ?3)",
            params![statement.subject, statement.predicate, statement.object],
        )?;
        Ok(())
    }

    /// Delete link rows matching the filter, returning the count removed
    pub fn delete_links(&mut self, filter: &StatementFilter) -> Result<usize> {
        self.begin_if_needed()?;
        let (where_sql, args) = filter.where_clause("object_uri");
        let sql = format!("DELETE FROM links{where_sql}");
        let removed = self.conn.execute(&sql, params_from_iter(args))?;
        Ok(removed)
    }

    /// Count link rows matching the filter
    pub fn count_links(&self, filter: &StatementFilter) -> Result<usize> {
        let (where_sql, args) = filter.where_clause("object_uri");
        let sql = format!("SELECT COUNT(*) FROM links{where_sql}");
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(args), |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Literal Operations ==========

    /// Query literal rows, ordered by subject for stable bucketing
    pub fn query_literals(&self, filter: &StatementFilter) -> Result<Vec<LiteralStatement>> {
        let (where_sql, args) = filter.where_clause("value");
        let sql = format!(
            "SELECT subject_uri, predicate, value_type, value FROM literals{where_sql} ORDER BY subject_uri"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| self.row_to_literal(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Insert a literal row
    pub fn insert_literal(&mut self, statement: &LiteralStatement) -> Result<()> {
        self.begin_if_needed()?;
        self.conn.execute(
            "INSERT INTO literals (subject_uri, predicate, value_type, value) VALUES (?1, ?2, ?3, ?4)",
            params![
                statement.subject,
                statement.predicate,
                statement.kind.as_str(),
                statement.value,
            ],
        )?;
        Ok(())
    }

    /// Delete literal rows matching the filter, returning the count removed
    pub fn delete_literals(&mut self, filter: &StatementFilter) -> Result<usize> {
        self.begin_if_needed()?;
        let (where_sql, args) = filter.where_clause("value");
        let sql = format!("DELETE FROM literals{where_sql}");
        let removed = self.conn.execute(&sql, params_from_iter(args))?;
        Ok(removed)
    }

    /// Helper to convert a row to a LiteralStatement
    fn row_to_literal(&self, row: &rusqlite::Row) -> rusqlite::Result<LiteralStatement> {
        let kind_str: String = row.get(2)?;
        let kind = ValueKind::from_str(&kind_str).map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(LiteralStatement {
            subject: row.get(0)?,
            predicate: row.get(1)?,
            kind,
            value: row.get(3)?,
        })
    }

    // ========== Session Transaction ==========

    fn begin_if_needed(&mut self) -> Result<()> {
        if !self.in_txn {
            self.conn.execute("BEGIN TRANSACTION", [])?;
            self.in_txn = true;
        }
        Ok(())
    }

    /// Commit the open session transaction, if any
    pub fn commit(&mut self) -> Result<()> {
        if self.in_txn {
            self.conn.execute("COMMIT", [])?;
            self.in_txn = false;
        }
        Ok(())
    }

    /// Roll back the open session transaction, if any
    pub fn rollback(&mut self) -> Result<()> {
        if self.in_txn {
            self.conn.execute("ROLLBACK", [])?;
            self.in_txn = false;
        }
        Ok(())
    }

    // ========== Statistics ==========

    /// Count all link rows
    pub fn count_all_links(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count all literal rows
    pub fn count_all_literals(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM literals", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            links: self.count_all_links()?,
            literals: self.count_all_literals()?,
        })
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub links: usize,
    pub literals: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Links: {}", self.links)?;
        writeln!(f, "  Literals: {}", self.literals)
    }
}
