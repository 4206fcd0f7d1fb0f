//! Database schema definitions

/// SQL to create the links table (statements whose object is a subject URI)
pub const CREATE_LINKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_uri TEXT NOT NULL,
    predicate TEXT NOT NULL,
    object_uri TEXT NOT NULL
)
"#;

/// SQL to create the literals table (statements whose object is a primitive
/// value tagged with its kind)
pub const CREATE_LITERALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS literals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_uri TEXT NOT NULL,
    predicate TEXT NOT NULL,
    value_type TEXT NOT NULL,
    value TEXT NOT NULL
)
"#;

/// SQL to create the identity allocator table backing `next_identity`
pub const CREATE_ID_SEQUENCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS id_sequence (
    name TEXT PRIMARY KEY,
    next INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_links_subject ON links(subject_uri)",
    "CREATE INDEX IF NOT EXISTS idx_links_predicate ON links(predicate)",
    "CREATE INDEX IF NOT EXISTS idx_links_object ON links(object_uri)",
    "CREATE INDEX IF NOT EXISTS idx_literals_subject ON literals(subject_uri)",
    "CREATE INDEX IF NOT EXISTS idx_literals_predicate ON literals(predicate)",
    "CREATE INDEX IF NOT EXISTS idx_literals_value ON literals(value)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_LINKS_TABLE,
        CREATE_LITERALS_TABLE,
        CREATE_ID_SEQUENCE_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
