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

/// Declares a record and implements [Params][crate::params::Params] for it.
///
/// Every field carries a `#[param("...")]` attribute with its tag, placed
/// before any other field attribute or doc comment. Use `#[param("")]` to
/// take the defaults, the field name is then the key.
///
/// The tags are parsed the first time the record is converted. An invalid
/// tag panics at that point.
///
/// # Example
/// ```
/// stratus_gax::params! {
///     /// Lists the queues in an account.
///     #[derive(Clone, Debug, Default)]
///     pub struct ListQueues {
///         #[param(r#"name:"QueueNamePrefix,omitempty""#)]
///         /// Only return queues with this prefix.
///         pub prefix: String,
///         #[param(r#"name:"MaxResults" default:"1000""#)]
///         pub max_results: u32,
///     }
/// }
/// let map = stratus_gax::params::to_params(&ListQueues::default());
/// assert_eq!(map.get("MaxResults"), Some("1000"));
/// assert!(!map.contains_key("QueueNamePrefix"));
/// ```
#[macro_export]
macro_rules! params {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                #[param($tag:literal)]
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::params::Params for $name {
            fn field_tags() -> &'static [$crate::params::FieldTag] {
                static TAGS: ::std::sync::LazyLock<::std::vec::Vec<$crate::params::FieldTag>> =
                    ::std::sync::LazyLock::new(|| {
                        ::std::vec![
                            $( $crate::params::FieldTag::from_static(stringify!($field), $tag), )*
                        ]
                    });
                TAGS.as_slice()
            }
        }

        impl $crate::params::ParamValue for $name {
            const NESTED: bool = true;

            fn is_zero(&self) -> bool {
                true $( && $crate::params::ParamValue::is_zero(&self.$field) )*
            }

            #[allow(unused_variables, unused_mut)]
            fn write(
                &self,
                prefix: &str,
                _tag: &$crate::params::FieldTag,
                out: &mut $crate::params::ParamMap,
            ) {
                let mut tags = <Self as $crate::params::Params>::field_tags().iter();
                $(
                    if let Some(tag) = tags.next() {
                        if let Some(key) = tag.key() {
                            $crate::params::write_field(
                                &self.$field,
                                &format!("{prefix}{key}"),
                                tag,
                                out,
                            );
                        }
                    }
                )*
            }

            #[allow(unused_variables, unused_mut)]
            fn read(
                &mut self,
                prefix: &str,
                _tag: &$crate::params::FieldTag,
                src: &$crate::params::ParamMap,
            ) -> ::std::result::Result<(), $crate::params::Error> {
                let mut tags = <Self as $crate::params::Params>::field_tags().iter();
                $(
                    if let Some(tag) = tags.next() {
                        if let Some(key) = tag.key() {
                            $crate::params::read_field(
                                &mut self.$field,
                                &format!("{prefix}{key}"),
                                tag,
                                src,
                            )?;
                        }
                    }
                )*
                Ok(())
            }

            fn present(
                prefix: &str,
                _tag: &$crate::params::FieldTag,
                src: &$crate::params::ParamMap,
            ) -> bool {
                src.has_prefix(prefix)
            }
        }
    };
}
