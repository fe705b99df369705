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

//! Converts request and response records to and from flat string multimaps.
//!
//! Query-style services send their parameters as a query string or a form
//! body, and several services carry request fields in HTTP headers. Both
//! surfaces are flat multimaps, represented by [ParamMap]. Records declared
//! with the [params!][crate::params!] macro describe how each field maps to
//! keys in that multimap:
//!
//! | Tag       | Effect                                                                    |
//! |-----------|---------------------------------------------------------------------------|
//! | `name`    | The key, or `-` to skip. Empty uses the field name.                       |
//! |           | A `,omitempty` suffix skips zero values.                                  |
//! | `default` | Emitted in place of a zero value.                                         |
//! | `format`  | The `chrono` layout for time fields, RFC 3339 if absent.                  |
//! | `base`    | The first index for `#` placeholders, 0 if absent.                        |
//!
//! In keys, `#` is replaced by the (based) index of each sequence element and
//! `*` by each map key. Nested records extend the key of the parent field.
//! Sequence elements that produce no keys at all are not preserved when
//! reading, see [ParamValue] for `Vec`.
//!
//! # Example
//! ```
//! use stratus_gax::params::{self, ParamMap};
//!
//! stratus_gax::params! {
//!     #[derive(Clone, Debug, Default, PartialEq)]
//!     pub struct Tag {
//!         #[param(r#"name:"Key""#)]
//!         pub key: String,
//!         #[param(r#"name:"Value""#)]
//!         pub value: String,
//!     }
//! }
//!
//! stratus_gax::params! {
//!     #[derive(Clone, Debug, Default, PartialEq)]
//!     pub struct CreateTags {
//!         #[param(r#"name:"ResourceId.#" base:"1""#)]
//!         pub resources: Vec<String>,
//!         #[param(r#"name:"Tag.#." base:"1""#)]
//!         pub tags: Vec<Tag>,
//!         #[param(r#"name:"DryRun,omitempty""#)]
//!         pub dry_run: bool,
//!     }
//! }
//!
//! let request = CreateTags {
//!     resources: vec!["i-1234".into()],
//!     tags: vec![Tag { key: "env".into(), value: "prod".into() }],
//!     dry_run: false,
//! };
//! let map = params::to_params(&request);
//! assert_eq!(map.get("ResourceId.1"), Some("i-1234"));
//! assert_eq!(map.get("Tag.1.Key"), Some("env"));
//! assert_eq!(map.get("Tag.1.Value"), Some("prod"));
//! assert!(!map.contains_key("DryRun"));
//!
//! let back: CreateTags = params::from_params(&map)?;
//! assert_eq!(back, request);
//! # Ok::<(), params::Error>(())
//! ```

mod macros;
mod map;
mod value;

pub use map::ParamMap;
pub use value::{DEFAULT_TIME_FORMAT, FieldTag, ParamValue, read_field, write_field};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The errors reported while converting records.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("cannot parse the value {value:?} for key {key:?}: {source}")]
    Parse {
        key: String,
        value: String,
        #[source]
        source: BoxError,
    },
    #[error("invalid header {key:?}: {source}")]
    InvalidHeader {
        key: String,
        #[source]
        source: BoxError,
    },
}

/// Records whose fields map to [ParamMap] keys.
///
/// Implemented by the [params!][crate::params!] macro.
pub trait Params: ParamValue + Default {
    /// The parsed tags, one per field in declaration order.
    fn field_tags() -> &'static [FieldTag];
}

/// Converts a record into a multimap.
pub fn to_params<T: Params>(value: &T) -> ParamMap {
    let mut out = ParamMap::new();
    value.write("", &FieldTag::default(), &mut out);
    out
}

/// Builds a record from a multimap.
///
/// Fields without matching keys keep their zero value.
pub fn from_params<T: Params>(src: &ParamMap) -> Result<T, Error> {
    let mut value = T::default();
    value.read("", &FieldTag::default(), src)?;
    Ok(value)
}

/// Converts a record into HTTP headers.
pub fn to_headers<T: Params>(value: &T) -> Result<http::HeaderMap, Error> {
    to_params(value).to_header_map()
}

/// Builds a record from HTTP headers.
///
/// Header names are matched case-insensitively.
pub fn from_headers<T: Params>(headers: &http::HeaderMap) -> Result<T, Error> {
    from_params(&ParamMap::from_headers(headers)?)
}
