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

//! Parses field tags.
//!
//! Request and document types annotate each field with a tag string, a space
//! separated list of `key:"value"` pairs, for example:
//!
//! ```text
//! name:"Filter.#.Value.#" base:"1"
//! ```
//!
//! Values are double-quoted and may contain `\"` and `\\` escapes. Each
//! consumer validates the keys it understands with
//! [StructTag::ensure_known], so a misspelled key is reported instead of
//! being silently ignored.

/// The errors reported while parsing or validating a tag.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("malformed tag {tag:?} at offset {offset}")]
    Malformed { tag: String, offset: usize },
    #[error("the key {0:?} appears more than once")]
    Duplicate(String),
    #[error("unknown key {0:?}")]
    Unknown(String),
    #[error("invalid value {value:?} for key {key:?}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// The parsed representation of a field tag.
///
/// # Example
/// ```
/// # use stratus_gax::tag::StructTag;
/// let tag = StructTag::parse(r#"name:"Item.#" base:"1""#)?;
/// assert_eq!(tag.get("name"), Some("Item.#"));
/// assert_eq!(tag.get("base"), Some("1"));
/// assert_eq!(tag.get("format"), None);
/// # Ok::<(), stratus_gax::tag::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructTag {
    entries: Vec<(String, String)>,
}

impl StructTag {
    /// Parses a tag string.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        let malformed = |offset: usize| Error::Malformed {
            tag: tag.to_string(),
            offset,
        };
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut chars = tag.char_indices().peekable();
        loop {
            while chars.next_if(|(_, c)| c.is_ascii_whitespace()).is_some() {}
            let Some(&(start, _)) = chars.peek() else {
                break;
            };
            let mut key = String::new();
            while let Some((_, c)) =
                chars.next_if(|(_, c)| *c != ':' && *c != '"' && !c.is_whitespace())
            {
                key.push(c);
            }
            if key.is_empty() {
                return Err(malformed(start));
            }
            match chars.next() {
                Some((_, ':')) => {}
                Some((offset, _)) => return Err(malformed(offset)),
                None => return Err(malformed(tag.len())),
            }
            match chars.next() {
                Some((_, '"')) => {}
                Some((offset, _)) => return Err(malformed(offset)),
                None => return Err(malformed(tag.len())),
            }
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some((_, '"')) => break,
                    Some((offset, '\\')) => match chars.next() {
                        Some((_, c @ ('"' | '\\'))) => value.push(c),
                        _ => return Err(malformed(offset)),
                    },
                    Some((_, c)) => value.push(c),
                    None => return Err(malformed(tag.len())),
                }
            }
            // Pairs must be separated by whitespace.
            if let Some(&(offset, c)) = chars.peek() {
                if !c.is_ascii_whitespace() {
                    return Err(malformed(offset));
                }
            }
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(Error::Duplicate(key));
            }
            entries.push((key, value));
        }
        Ok(Self { entries })
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the keys in the order they appear in the tag.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an error naming the first key not in `allowed`.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::tag::{Error, StructTag};
    /// let tag = StructTag::parse(r#"name:"Id" fromat:"%Y""#)?;
    /// let err = tag.ensure_known(&["name", "format"]).unwrap_err();
    /// assert_eq!(err, Error::Unknown("fromat".to_string()));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn ensure_known(&self, allowed: &[&str]) -> Result<(), Error> {
        match self.keys().find(|k| !allowed.contains(k)) {
            Some(k) => Err(Error::Unknown(k.to_string())),
            None => Ok(()),
        }
    }

    /// Returns true if the tag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
