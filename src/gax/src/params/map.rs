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

use super::Error;
use http::{HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Everything but the RFC 3986 unreserved characters is encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A flat multimap from string keys to string values.
///
/// This is the representation of query strings, form bodies, and header
/// surfaces. Keys are kept in sorted order, values keep their insertion order.
///
/// Maps built from HTTP headers compare keys case-insensitively.
///
/// # Example
/// ```
/// # use stratus_gax::params::ParamMap;
/// let mut params = ParamMap::new();
/// params.add("Action", "ListFoos");
/// params.add("Filter.1", "a b");
/// assert_eq!(params.get("Action"), Some("ListFoos"));
/// assert_eq!(params.to_query_string(), "Action=ListFoos&Filter.1=a%20b");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamMap {
    entries: BTreeMap<String, Vec<String>>,
    fold_case: bool,
}

impl ParamMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map from HTTP headers.
    ///
    /// Header names are compared case-insensitively in lookups on the
    /// resulting map.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, Error> {
        let mut map = Self {
            fold_case: true,
            ..Default::default()
        };
        for (name, value) in headers {
            let value = value.to_str().map_err(|e| Error::InvalidHeader {
                key: name.to_string(),
                source: e.into(),
            })?;
            map.add(name.as_str(), value);
        }
        Ok(map)
    }

    /// Appends a value for `key`.
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = self.normalized(key.into());
        self.entries.entry(key).or_default().push(value.into());
    }

    /// Replaces all the values for `key`.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = self.normalized(key.into());
        self.entries.insert(key, vec![value.into()]);
    }

    /// Returns the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(self.fold(key).as_ref())
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Returns all the values for `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .get(self.fold(key).as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Removes `key`, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let key = self.fold(key).into_owned();
        self.entries.remove(&key)
    }

    /// Returns true if `key` has at least one value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(self.fold(key).as_ref())
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the `(key, values)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Appends all the values in `other`.
    pub fn extend(&mut self, other: ParamMap) {
        for (k, values) in other.entries {
            for v in values {
                self.add(k.clone(), v);
            }
        }
    }

    /// Formats the map as a query string.
    ///
    /// Keys are sorted, repeated keys produce one pair per value, and both
    /// keys and values are percent-encoded except for the RFC 3986
    /// unreserved characters.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k, v)))
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_ENCODE_SET),
                    utf8_percent_encode(v, QUERY_ENCODE_SET)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Converts the map into HTTP headers.
    pub fn to_header_map(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        for (k, values) in &self.entries {
            let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| Error::InvalidHeader {
                key: k.clone(),
                source: e.into(),
            })?;
            for v in values {
                let value = HeaderValue::from_str(v).map_err(|e| Error::InvalidHeader {
                    key: k.clone(),
                    source: e.into(),
                })?;
                headers.append(name.clone(), value);
            }
        }
        Ok(headers)
    }

    /// Returns true if any key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let prefix = self.fold(prefix);
        self.entries
            .range::<str, _>((
                std::ops::Bound::Included(prefix.as_ref()),
                std::ops::Bound::Unbounded,
            ))
            .next()
            .is_some_and(|(k, _)| k.starts_with(prefix.as_ref()))
    }

    /// Recovers the indices matched by a `head` + index + `tail` pattern.
    ///
    /// With `nested` set the tail may be followed by more characters, the keys
    /// of a nested record.
    pub(crate) fn indices(&self, head: &str, tail: &str, nested: bool) -> BTreeSet<usize> {
        let (head, tail) = (self.fold(head), self.fold(tail));
        self.entries
            .keys()
            .filter_map(|k| k.strip_prefix(head.as_ref()))
            .filter_map(|rest| {
                let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
                let (index, rest) = rest.split_at(digits);
                let matched = if nested {
                    rest.starts_with(tail.as_ref())
                } else {
                    rest == tail.as_ref()
                };
                if matched { index.parse().ok() } else { None }
            })
            .collect()
    }

    /// Returns the `(captured, value)` pairs matched by a `head` + `*` + `tail`
    /// pattern.
    pub(crate) fn wildcard(&self, head: &str, tail: &str) -> Vec<(String, String)> {
        let (head, tail) = (self.fold(head), self.fold(tail));
        self.entries
            .iter()
            .filter_map(|(k, values)| {
                let captured = k
                    .strip_prefix(head.as_ref())
                    .and_then(|rest| rest.strip_suffix(tail.as_ref()))?;
                if captured.is_empty() {
                    return None;
                }
                values.first().map(|v| (captured.to_string(), v.clone()))
            })
            .collect()
    }

    fn normalized(&self, key: String) -> String {
        if self.fold_case {
            key.to_ascii_lowercase()
        } else {
            key
        }
    }

    fn fold<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if self.fold_case {
            Cow::Owned(key.to_ascii_lowercase())
        } else {
            Cow::Borrowed(key)
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ParamMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.add(k, v);
        }
        map
    }
}
