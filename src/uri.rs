//! Subject URI - Global, stable identity for every mapped object
//!
//! Format: `<type-name-lowercased>/<raw-id>`
//!
//! Examples:
//! - `person/42`
//! - `article/intro-to-triples`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global, stable URI for every subject in the statement store.
///
/// This URI serves as the primary key for:
/// - Link statements (subject and object columns)
/// - Literal statements (subject column)
/// - Referential-integrity checks on delete
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectUri {
    /// Type-name namespace segment, always lowercased
    pub type_name: String,
    /// Raw identity value, text-serialized
    pub raw_id: String,
}

impl SubjectUri {
    /// Classify a raw identity into its namespaced URI form.
    ///
    /// The type name is lowercased; the raw id is carried verbatim.
    pub fn classify(type_name: &str, raw_id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.to_lowercase(),
            raw_id: raw_id.into(),
        }
    }

    /// Parse a URI string into a SubjectUri.
    ///
    /// The first `/` delimits the type segment; the raw id may itself
    /// contain further `/` characters.
    pub fn parse(uri: &str) -> Result<Self> {
        let (type_name, raw_id) = uri
            .split_once('/')
            .ok_or_else(|| Error::InvalidUri(format!("URI must contain a type segment: {uri}")))?;

        if type_name.is_empty() {
            return Err(Error::InvalidUri(format!("URI type segment is empty: {uri}")));
        }
        if raw_id.is_empty() {
            return Err(Error::InvalidUri(format!("URI raw id is empty: {uri}")));
        }

        Ok(Self {
            type_name: type_name.to_string(),
            raw_id: raw_id.to_string(),
        })
    }

    /// Strip the namespace prefix, yielding the raw identity text.
    pub fn declassify(&self) -> &str {
        &self.raw_id
    }

    /// Convert to the stored URI string form
    pub fn to_uri_string(&self) -> String {
        format!("{}/{}", self.type_name, self.raw_id)
    }
}

impl fmt::Display for SubjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri_string())
    }
}

impl FromStr for SubjectUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SubjectUri {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_uri_string())
    }
}

impl<'de> Deserialize<'de> for SubjectUri {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SubjectUri::parse(&s).map_err(serde::de::Error::custom)
    }
}
