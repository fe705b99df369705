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

use super::{Error, ParamMap};
use crate::tag::{self, StructTag};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// The layout used for time fields without a `format` tag.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const KNOWN_KEYS: &[&str] = &["name", "default", "format", "base"];

/// The marshalling rules for one field, parsed from its tag.
///
/// # Example
/// ```
/// # use stratus_gax::params::FieldTag;
/// let tag = FieldTag::parse("items", r#"name:"Item.#,omitempty" base:"1""#)?;
/// assert_eq!(tag.key(), Some("Item.#"));
/// assert!(tag.omit_empty());
/// assert_eq!(tag.base(), 1);
///
/// let tag = FieldTag::parse("count", "")?;
/// assert_eq!(tag.key(), Some("count"));
/// # Ok::<(), stratus_gax::tag::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldTag {
    key: Option<String>,
    omit_empty: bool,
    default: Option<String>,
    format: Option<String>,
    base: usize,
}

impl FieldTag {
    /// Parses the tag for the field named `ident`.
    pub fn parse(ident: &str, tag: &str) -> Result<Self, tag::Error> {
        let parsed = StructTag::parse(tag)?;
        parsed.ensure_known(KNOWN_KEYS)?;
        let mut result = Self {
            key: Some(ident.to_string()),
            default: parsed.get("default").map(str::to_string),
            format: parsed.get("format").map(str::to_string),
            ..Default::default()
        };
        if let Some(name) = parsed.get("name") {
            let mut parts = name.split(',');
            let key = parts.next().unwrap_or_default();
            for option in parts {
                match option {
                    "omitempty" => result.omit_empty = true,
                    _ => {
                        return Err(tag::Error::InvalidValue {
                            key: "name".to_string(),
                            value: name.to_string(),
                            reason: format!("unknown option {option:?}"),
                        });
                    }
                }
            }
            result.key = match key {
                "-" => None,
                "" => Some(ident.to_string()),
                k => Some(k.to_string()),
            };
        }
        if let Some(base) = parsed.get("base") {
            result.base = base.parse().map_err(|e| tag::Error::InvalidValue {
                key: "base".to_string(),
                value: base.to_string(),
                reason: format!("{e}"),
            })?;
        }
        Ok(result)
    }

    /// Parses a tag known at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the tag is invalid. Tags are fixed by the type definition,
    /// an invalid tag is a programming error found the first time the type is
    /// marshalled.
    pub fn from_static(ident: &str, tag: &str) -> Self {
        Self::parse(ident, tag)
            .unwrap_or_else(|e| panic!("invalid param tag on field `{ident}`: {e}"))
    }

    /// The key template, `None` if the field is skipped.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// If true, zero values produce no entries.
    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// The literal emitted in place of a zero value.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// The time layout, `chrono` strftime syntax.
    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)
    }

    /// The first index used to expand `#` placeholders.
    pub fn base(&self) -> usize {
        self.base
    }
}

/// Types that can be converted to and from [ParamMap] entries.
///
/// Scalars write a single entry under `key`. Sequences and maps expand the
/// `#` and `*` placeholders in `key`. Records, typically declared with
/// [params!][crate::params!], use `key` as a prefix for the keys of their
/// fields.
pub trait ParamValue {
    /// True for records, whose keys extend the key of the parent field.
    const NESTED: bool = false;

    /// Returns true if the value is the zero value of its type.
    fn is_zero(&self) -> bool;

    /// Appends the entries for this value.
    fn write(&self, key: &str, tag: &FieldTag, out: &mut ParamMap);

    /// Populates this value from the entries in `src`.
    ///
    /// Values without matching entries are left unchanged.
    fn read(&mut self, key: &str, tag: &FieldTag, src: &ParamMap) -> Result<(), Error>;

    /// Returns true if `src` has any entries for a value at `key`.
    fn present(key: &str, _tag: &FieldTag, src: &ParamMap) -> bool
    where
        Self: Sized,
    {
        src.contains_key(key)
    }
}

/// Writes one field, applying the `omitempty` and `default` rules.
pub fn write_field<V: ParamValue>(value: &V, key: &str, tag: &FieldTag, out: &mut ParamMap) {
    if value.is_zero() {
        if tag.omit_empty() {
            return;
        }
        if let Some(d) = tag.default_value() {
            out.add(key, d);
            return;
        }
    }
    value.write(key, tag, out);
}

/// Reads one field.
///
/// A single value equal to the `default` tag leaves the field at its zero
/// value, the inverse of [write_field].
pub fn read_field<V: ParamValue>(
    value: &mut V,
    key: &str,
    tag: &FieldTag,
    src: &ParamMap,
) -> Result<(), Error> {
    if let Some(d) = tag.default_value() {
        if matches!(src.get_all(key), [v] if v == d) {
            return Ok(());
        }
    }
    value.read(key, tag, src)
}

fn parse_error<E>(key: &str, value: &str, e: E) -> Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Error::Parse {
        key: key.to_string(),
        value: value.to_string(),
        source: e.into(),
    }
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl ParamValue for $t {
                fn is_zero(&self) -> bool {
                    *self == <$t>::default()
                }

                fn write(&self, key: &str, _tag: &FieldTag, out: &mut ParamMap) {
                    out.add(key, self.to_string());
                }

                fn read(
                    &mut self,
                    key: &str,
                    _tag: &FieldTag,
                    src: &ParamMap,
                ) -> Result<(), Error> {
                    if let Some(raw) = src.get(key) {
                        *self = raw.parse::<$t>().map_err(|e| parse_error(key, raw, e))?;
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_scalar!(
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl ParamValue for DateTime<Utc> {
    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::UNIX_EPOCH
    }

    fn write(&self, key: &str, tag: &FieldTag, out: &mut ParamMap) {
        out.add(key, self.format(tag.format()).to_string());
    }

    fn read(&mut self, key: &str, tag: &FieldTag, src: &ParamMap) -> Result<(), Error> {
        let Some(raw) = src.get(key) else {
            return Ok(());
        };
        // Layouts with an offset produce an aware time, all others are UTC.
        let format = tag.format();
        *self = DateTime::parse_from_str(raw, format)
            .map(|t| t.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, format).map(|t| t.and_utc()))
            .or_else(|_| {
                NaiveDate::parse_from_str(raw, format).map(|d| d.and_time(NaiveTime::MIN).and_utc())
            })
            .map_err(|e| parse_error(key, raw, e))?;
        Ok(())
    }
}

impl<T> ParamValue for Option<T>
where
    T: ParamValue + Default,
{
    const NESTED: bool = T::NESTED;

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn write(&self, key: &str, tag: &FieldTag, out: &mut ParamMap) {
        if let Some(v) = self {
            v.write(key, tag, out);
        }
    }

    fn read(&mut self, key: &str, tag: &FieldTag, src: &ParamMap) -> Result<(), Error> {
        if !T::present(key, tag, src) {
            return Ok(());
        }
        let mut v = T::default();
        v.read(key, tag, src)?;
        *self = Some(v);
        Ok(())
    }

    fn present(key: &str, tag: &FieldTag, src: &ParamMap) -> bool {
        T::present(key, tag, src)
    }
}

/// Sequences expand the `#` placeholder to `index + base`.
///
/// Without a placeholder each element is appended to the same key.
///
/// An element that writes no entries, such as a record whose fields are all
/// `omitempty` and zero, leaves a gap in the indices. Reading collects the
/// indices that are present in ascending order, so that element is dropped
/// and the elements after it move down.
impl<T> ParamValue for Vec<T>
where
    T: ParamValue + Default,
{
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn write(&self, key: &str, tag: &FieldTag, out: &mut ParamMap) {
        match key.split_once('#') {
            Some((head, tail)) => {
                for (i, v) in self.iter().enumerate() {
                    let key = format!("{head}{}{tail}", i + tag.base());
                    v.write(&key, tag, out);
                }
            }
            None => self.iter().for_each(|v| v.write(key, tag, out)),
        }
    }

    fn read(&mut self, key: &str, tag: &FieldTag, src: &ParamMap) -> Result<(), Error> {
        let Some((head, tail)) = key.split_once('#') else {
            let mut values = Vec::new();
            for raw in src.get_all(key) {
                let one = ParamMap::from_iter([(key, raw.as_str())]);
                let mut v = T::default();
                v.read(key, tag, &one)?;
                values.push(v);
            }
            if !values.is_empty() {
                *self = values;
            }
            return Ok(());
        };
        let indices = src.indices(head, tail, T::NESTED);
        if indices.is_empty() {
            return Ok(());
        }
        let mut values = Vec::with_capacity(indices.len());
        for index in indices {
            let mut v = T::default();
            v.read(&format!("{head}{index}{tail}"), tag, src)?;
            values.push(v);
        }
        *self = values;
        Ok(())
    }

    fn present(key: &str, _tag: &FieldTag, src: &ParamMap) -> bool {
        match key.split_once('#') {
            Some((head, tail)) => !src.indices(head, tail, T::NESTED).is_empty(),
            None => src.contains_key(key),
        }
    }
}

// Maps expand the `*` placeholder to each map key. Without a placeholder the
// map key is appended to the field key.
fn map_key(key: &str, name: &str) -> String {
    match key.split_once('*') {
        Some((head, tail)) => format!("{head}{name}{tail}"),
        None => format!("{key}{name}"),
    }
}

fn map_entries(key: &str, src: &ParamMap) -> Vec<(String, String)> {
    match key.split_once('*') {
        Some((head, tail)) => src.wildcard(head, tail),
        None => src.wildcard(key, ""),
    }
}

macro_rules! impl_string_map {
    ($($map:ident),*) => {
        $(
            impl ParamValue for $map<String, String> {
                fn is_zero(&self) -> bool {
                    self.is_empty()
                }

                fn write(&self, key: &str, _tag: &FieldTag, out: &mut ParamMap) {
                    for (k, v) in self {
                        out.add(map_key(key, k), v.as_str());
                    }
                }

                fn read(
                    &mut self,
                    key: &str,
                    _tag: &FieldTag,
                    src: &ParamMap,
                ) -> Result<(), Error> {
                    self.extend(map_entries(key, src));
                    Ok(())
                }

                fn present(key: &str, _tag: &FieldTag, src: &ParamMap) -> bool {
                    !map_entries(key, src).is_empty()
                }
            }
        )*
    };
}

impl_string_map!(HashMap, BTreeMap);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn tag(t: &str) -> FieldTag {
        FieldTag::from_static("field", t)
    }

    #[test]
    fn field_tag_defaults() -> anyhow::Result<()> {
        let t = FieldTag::parse("field", "")?;
        assert_eq!(t.key(), Some("field"));
        assert!(!t.omit_empty());
        assert_eq!(t.default_value(), None);
        assert_eq!(t.format(), DEFAULT_TIME_FORMAT);
        assert_eq!(t.base(), 0);
        Ok(())
    }

    #[test_case(r#"name:"-""#, None, false)]
    #[test_case(r#"name:",omitempty""#, Some("field"), true)]
    #[test_case(r#"name:"N,omitempty""#, Some("N"), true)]
    #[test_case(r#"name:"N""#, Some("N"), false)]
    #[test_case(r#"name:"""#, Some("field"), false)]
    fn field_tag_name(input: &str, key: Option<&str>, omit: bool) -> anyhow::Result<()> {
        let t = FieldTag::parse("field", input)?;
        assert_eq!(t.key(), key);
        assert_eq!(t.omit_empty(), omit);
        Ok(())
    }

    #[test_case(r#"name:"N,required""#)]
    #[test_case(r#"base:"one""#)]
    #[test_case(r#"base:"-1""#)]
    fn field_tag_invalid_value(input: &str) {
        let got = FieldTag::parse("field", input);
        assert!(matches!(got, Err(tag::Error::InvalidValue { .. })), "{got:?}");
    }

    #[test]
    fn field_tag_unknown_key() {
        let got = FieldTag::parse("field", r#"nmae:"N""#);
        assert_eq!(got, Err(tag::Error::Unknown("nmae".to_string())));
    }

    #[test]
    #[should_panic(expected = "invalid param tag on field `field`")]
    fn from_static_panics() {
        let _ = FieldTag::from_static("field", r#"name:"N"#);
    }

    #[test_case(true, "true")]
    #[test_case(false, "false")]
    fn bool_values(input: bool, want: &str) -> anyhow::Result<()> {
        let mut out = ParamMap::new();
        input.write("k", &tag(""), &mut out);
        assert_eq!(out.get("k"), Some(want));
        let mut got = !input;
        got.read("k", &tag(""), &out)?;
        assert_eq!(got, input);
        Ok(())
    }

    #[test_case(7_f64, "7")]
    #[test_case(0.5_f64, "0.5")]
    #[test_case(-12.25_f64, "-12.25")]
    #[test_case(0.1_f64, "0.1")]
    fn float_values(input: f64, want: &str) {
        let mut out = ParamMap::new();
        input.write("k", &tag(""), &mut out);
        assert_eq!(out.get("k"), Some(want));
    }

    #[test]
    fn integer_values() -> anyhow::Result<()> {
        let mut out = ParamMap::new();
        (-42_i32).write("a", &tag(""), &mut out);
        u64::MAX.write("b", &tag(""), &mut out);
        assert_eq!(out.get("a"), Some("-42"));
        assert_eq!(out.get("b"), Some("18446744073709551615"));
        let mut a = 0_i32;
        a.read("a", &tag(""), &out)?;
        assert_eq!(a, -42);
        let mut b = 0_u64;
        b.read("b", &tag(""), &out)?;
        assert_eq!(b, u64::MAX);
        Ok(())
    }

    #[test]
    fn parse_error() {
        let src = ParamMap::from_iter([("k", "seven")]);
        let mut v = 0_i64;
        let got = v.read("k", &tag(""), &src);
        assert!(
            matches!(&got, Err(Error::Parse { key, value, .. }) if key == "k" && value == "seven"),
            "{got:?}"
        );
    }

    #[test]
    fn time_default_format() -> anyhow::Result<()> {
        let t = Utc.with_ymd_and_hms(2013, 8, 1, 12, 30, 45).unwrap();
        let mut out = ParamMap::new();
        t.write("k", &tag(""), &mut out);
        assert_eq!(out.get("k"), Some("2013-08-01T12:30:45Z"));
        let mut got = DateTime::<Utc>::UNIX_EPOCH;
        got.read("k", &tag(""), &out)?;
        assert_eq!(got, t);
        Ok(())
    }

    #[test]
    fn time_custom_format() -> anyhow::Result<()> {
        let t = Utc.with_ymd_and_hms(2013, 8, 1, 12, 30, 45).unwrap();
        let custom = tag(r#"format:"%a, %d %b %Y %H:%M:%S GMT""#);
        let mut out = ParamMap::new();
        t.write("k", &custom, &mut out);
        assert_eq!(out.get("k"), Some("Thu, 01 Aug 2013 12:30:45 GMT"));
        let mut got = DateTime::<Utc>::UNIX_EPOCH;
        got.read("k", &custom, &out)?;
        assert_eq!(got, t);
        Ok(())
    }

    #[test]
    fn time_with_offset() -> anyhow::Result<()> {
        let custom = tag(r#"format:"%Y-%m-%dT%H:%M:%S%z""#);
        let src = ParamMap::from_iter([("k", "2013-08-01T14:30:45+0200")]);
        let mut got = DateTime::<Utc>::UNIX_EPOCH;
        got.read("k", &custom, &src)?;
        assert_eq!(got, Utc.with_ymd_and_hms(2013, 8, 1, 12, 30, 45).unwrap());
        Ok(())
    }

    #[test]
    fn time_parse_error() {
        let src = ParamMap::from_iter([("k", "yesterday")]);
        let mut got = DateTime::<Utc>::UNIX_EPOCH;
        let result = got.read("k", &tag(""), &src);
        assert!(matches!(result, Err(Error::Parse { .. })), "{result:?}");
    }

    #[test]
    fn option_values() -> anyhow::Result<()> {
        let mut out = ParamMap::new();
        None::<i32>.write("a", &tag(""), &mut out);
        Some(0_i32).write("b", &tag(""), &mut out);
        assert_eq!(out.get("a"), None);
        assert_eq!(out.get("b"), Some("0"));
        assert!(None::<i32>.is_zero());
        assert!(!Some(0_i32).is_zero());

        let mut a = Some(5_i32);
        a.read("a", &tag(""), &out)?;
        assert_eq!(a, Some(5));
        let mut b = None::<i32>;
        b.read("b", &tag(""), &out)?;
        assert_eq!(b, Some(0));
        Ok(())
    }

    #[test]
    fn sequence_with_base() -> anyhow::Result<()> {
        let items = vec!["a".to_string(), "b".to_string()];
        let mut out = ParamMap::new();
        items.write("Items.#", &tag(r#"base:"2""#), &mut out);
        let want = ParamMap::from_iter([("Items.2", "a"), ("Items.3", "b")]);
        assert_eq!(out, want);

        let mut got = Vec::<String>::new();
        got.read("Items.#", &tag(r#"base:"2""#), &out)?;
        assert_eq!(got, items);
        Ok(())
    }

    #[test]
    fn sequence_sorts_and_compacts_indices() -> anyhow::Result<()> {
        let src = ParamMap::from_iter([("Id.10", "c"), ("Id.2", "a"), ("Id.5", "b")]);
        let mut got = Vec::<String>::new();
        got.read("Id.#", &tag(""), &src)?;
        assert_eq!(got, vec!["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn sequence_repeated_key() -> anyhow::Result<()> {
        let items = vec![1_i32, 2, 3];
        let mut out = ParamMap::new();
        items.write("Id", &tag(""), &mut out);
        assert_eq!(out.get_all("Id"), &["1", "2", "3"]);
        let mut got = Vec::<i32>::new();
        got.read("Id", &tag(""), &out)?;
        assert_eq!(got, items);
        Ok(())
    }

    #[test]
    fn map_placeholder() -> anyhow::Result<()> {
        let m = HashMap::from([
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ]);
        let mut out = ParamMap::new();
        m.write("M-*", &tag(""), &mut out);
        let want = ParamMap::from_iter([("M-x", "1"), ("M-y", "2")]);
        assert_eq!(out, want);

        let mut got = HashMap::new();
        got.read("M-*", &tag(""), &out)?;
        assert_eq!(got, m);
        Ok(())
    }

    #[test]
    fn map_placeholder_with_tail() -> anyhow::Result<()> {
        let m = BTreeMap::from([("color".to_string(), "blue".to_string())]);
        let mut out = ParamMap::new();
        m.write("Attr.*.Value", &tag(""), &mut out);
        assert_eq!(out.get("Attr.color.Value"), Some("blue"));
        let mut got = BTreeMap::new();
        got.read("Attr.*.Value", &tag(""), &out)?;
        assert_eq!(got, m);
        Ok(())
    }

    #[test]
    fn write_field_rules() {
        let mut out = ParamMap::new();
        write_field(&0_i32, "omitted", &tag(r#"name:",omitempty" default:"D""#), &mut out);
        write_field(&0_i32, "defaulted", &tag(r#"default:"D""#), &mut out);
        write_field(&0_i32, "zero", &tag(""), &mut out);
        write_field(&3_i32, "set", &tag(r#"name:",omitempty" default:"D""#), &mut out);
        write_field(&Vec::<String>::new(), "empty.#", &tag(r#"name:",omitempty""#), &mut out);
        let want = ParamMap::from_iter([("defaulted", "D"), ("set", "3"), ("zero", "0")]);
        assert_eq!(out, want);
    }

    #[test]
    fn read_field_default() -> anyhow::Result<()> {
        let src = ParamMap::from_iter([("k", "D")]);
        let mut got = String::new();
        read_field(&mut got, "k", &tag(r#"default:"D""#), &src)?;
        assert_eq!(got, "");
        read_field(&mut got, "k", &tag(""), &src)?;
        assert_eq!(got, "D");
        Ok(())
    }
}
