// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use gax::tag::{self, StructTag};
use std::collections::BTreeSet;

const KNOWN_KEYS: &[&str] = &["attr", "key", "index"];

/// The errors in a record's declaration.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("invalid tag on field {field}: {source}")]
    Tag {
        field: String,
        #[source]
        source: tag::Error,
    },
    #[error("the table {table} has no hash key")]
    MissingHashKey { table: String },
    #[error("the table {table} has more than one {role} key, the second is field {field}")]
    DuplicateKey {
        table: String,
        role: KeyRole,
        field: String,
    },
    #[error("the attribute {name} appears more than once in table {table}")]
    DuplicateAttribute { table: String, name: String },
    #[error("the field {field} is skipped, it cannot be a key")]
    SkippedKey { field: String },
}

/// The part a field plays in the primary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRole {
    Hash,
    Range,
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash => write!(f, "hash"),
            Self::Range => write!(f, "range"),
        }
    }
}

impl std::str::FromStr for KeyRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(Self::Hash),
            "range" => Ok(Self::Range),
            _ => Err(r#"expected "hash" or "range""#.to_string()),
        }
    }
}

/// A modeled field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    ident: String,
    name: String,
    key: Option<KeyRole>,
    indexes: Vec<String>,
}

impl FieldSchema {
    /// The field name in the record.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// The attribute name in the store.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> Option<KeyRole> {
        self.key
    }

    /// The secondary indexes using this attribute.
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }
}

/// The mapping between a record and a table.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    table: String,
    fields: Vec<Option<FieldSchema>>,
    hash_key: FieldSchema,
    range_key: Option<FieldSchema>,
}

impl Schema {
    /// Parses the tags of a record's fields.
    ///
    /// `fields` contains the field identifiers and their tags, in
    /// declaration order.
    ///
    /// # Example
    /// ```
    /// # use stratus_dynamodb::mapper::{KeyRole, Schema};
    /// let schema = Schema::parse(
    ///     "Users",
    ///     &[("id", r#"attr:"UserId" key:"hash""#), ("email", r#"index:"ByEmail""#)],
    /// )?;
    /// assert_eq!(schema.hash_key().name(), "UserId");
    /// assert_eq!(schema.hash_key().key(), Some(KeyRole::Hash));
    /// assert!(schema.range_key().is_none());
    /// assert_eq!(schema.index_attributes("ByEmail").collect::<Vec<_>>(), vec!["email"]);
    /// # Ok::<(), stratus_dynamodb::mapper::SchemaError>(())
    /// ```
    pub fn parse(table: &str, fields: &[(&str, &str)]) -> Result<Self, SchemaError> {
        let mut parsed = Vec::with_capacity(fields.len());
        let mut hash_key = None;
        let mut range_key = None;
        let mut names = BTreeSet::new();
        for (position, (ident, tag)) in fields.iter().enumerate() {
            let field = parse_field(ident, tag)?;
            let Some(field) = field else {
                parsed.push(None);
                continue;
            };
            if !names.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateAttribute {
                    table: table.to_string(),
                    name: field.name,
                });
            }
            if let Some(role) = field.key {
                let slot = match role {
                    KeyRole::Hash => &mut hash_key,
                    KeyRole::Range => &mut range_key,
                };
                if slot.replace(position).is_some() {
                    return Err(SchemaError::DuplicateKey {
                        table: table.to_string(),
                        role,
                        field: field.ident,
                    });
                }
            }
            parsed.push(Some(field));
        }
        let field_at = |p: usize| parsed.get(p).cloned().flatten();
        let Some(hash_key) = hash_key.and_then(field_at) else {
            return Err(SchemaError::MissingHashKey {
                table: table.to_string(),
            });
        };
        let range_key = range_key.and_then(field_at);
        Ok(Self {
            table: table.to_string(),
            fields: parsed,
            hash_key,
            range_key,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The fields in declaration order, `None` for skipped fields.
    pub fn fields(&self) -> &[Option<FieldSchema>] {
        &self.fields
    }

    pub fn hash_key(&self) -> &FieldSchema {
        &self.hash_key
    }

    pub fn range_key(&self) -> Option<&FieldSchema> {
        self.range_key.as_ref()
    }

    /// The names of the secondary indexes used by any attribute.
    pub fn indexes(&self) -> BTreeSet<&str> {
        self.modeled_fields()
            .flat_map(|f| f.indexes.iter().map(String::as_str))
            .collect()
    }

    /// The attributes participating in `index`.
    pub fn index_attributes<'a>(&'a self, index: &'a str) -> impl Iterator<Item = &'a str> {
        self.modeled_fields()
            .filter(move |f| f.indexes.iter().any(|i| i == index))
            .map(|f| f.name.as_str())
    }

    fn modeled_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().flatten()
    }
}

fn parse_field(ident: &str, tag: &str) -> Result<Option<FieldSchema>, SchemaError> {
    let tag_error = |source| SchemaError::Tag {
        field: ident.to_string(),
        source,
    };
    let parsed = StructTag::parse(tag).map_err(tag_error)?;
    parsed.ensure_known(KNOWN_KEYS).map_err(tag_error)?;
    let key = parsed
        .get("key")
        .map(|v| {
            v.parse::<KeyRole>().map_err(|reason| {
                tag_error(tag::Error::InvalidValue {
                    key: "key".to_string(),
                    value: v.to_string(),
                    reason,
                })
            })
        })
        .transpose()?;
    let name = match parsed.get("attr") {
        Some("-") if key.is_some() => {
            return Err(SchemaError::SkippedKey {
                field: ident.to_string(),
            });
        }
        Some("-") => return Ok(None),
        None | Some("") => ident.to_string(),
        Some(n) => n.to_string(),
    };
    let indexes = parsed
        .get("index")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(Some(FieldSchema {
        ident: ident.to_string(),
        name,
        key,
        indexes,
    }))
}
