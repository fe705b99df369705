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

//! The wire model for the item operations.
//!
//! Field names follow the service's JSON protocol, where members are in
//! `PascalCase` and absent members are omitted.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use std::collections::HashMap;

/// An attribute map, as found in items and keys.
pub type Item = HashMap<String, AttributeValue>;

/// The value of an attribute.
///
/// Each value belongs to exactly one category. Numbers are carried as their
/// decimal representation, the service preserves their precision. Binary
/// values are base64 encoded on the wire.
///
/// # Example
/// ```
/// # use stratus_dynamodb::model::AttributeValue;
/// let v = AttributeValue::S("hello".into());
/// assert_eq!(serde_json::to_string(&v)?, r#"{"S":"hello"}"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A binary value.
    #[serde(rename = "B")]
    B(#[serde_as(as = "Base64")] Bytes),
    /// A set of binary values.
    #[serde(rename = "BS")]
    Bs(#[serde_as(as = "Vec<Base64>")] Vec<Bytes>),
    /// A number.
    #[serde(rename = "N")]
    N(String),
    /// A set of numbers.
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// A string.
    #[serde(rename = "S")]
    S(String),
    /// A set of strings.
    #[serde(rename = "SS")]
    Ss(Vec<String>),
}

impl AttributeValue {
    /// Returns true if the value carries no data.
    ///
    /// The service rejects empty values, the mapper omits or removes them.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::B(v) => v.is_empty(),
            Self::Bs(v) => v.is_empty(),
            Self::N(v) => v.is_empty(),
            Self::Ns(v) => v.is_empty(),
            Self::S(v) => v.is_empty(),
            Self::Ss(v) => v.is_empty(),
        }
    }

    /// The wire name of the value's category.
    pub fn category(&self) -> &'static str {
        match self {
            Self::B(_) => "B",
            Self::Bs(_) => "BS",
            Self::N(_) => "N",
            Self::Ns(_) => "NS",
            Self::S(_) => "S",
            Self::Ss(_) => "SS",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    In,
    Le,
    Lt,
    Ge,
    Gt,
    Between,
    NotNull,
    Null,
    Contains,
    NotContains,
    BeginsWith,
}

/// How several conditions in `Expected` are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionalOperator {
    #[default]
    And,
    Or,
}

/// A condition on the stored value of an attribute.
///
/// # Example
/// ```
/// # use stratus_dynamodb::model::*;
/// // Only succeed if the item does not exist yet.
/// let absent = ExpectedAttributeValue::default().set_exists(false);
/// // Only succeed if the version matches.
/// let version = ExpectedAttributeValue::default()
///     .set_comparison_operator(ComparisonOperator::Eq)
///     .set_attribute_value_list([AttributeValue::N("7".into())]);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct ExpectedAttributeValue {
    pub value: Option<AttributeValue>,
    pub exists: Option<bool>,
    pub comparison_operator: Option<ComparisonOperator>,
    pub attribute_value_list: Option<Vec<AttributeValue>>,
}

impl ExpectedAttributeValue {
    pub fn set_value<V: Into<AttributeValue>>(mut self, v: V) -> Self {
        self.value = Some(v.into());
        self
    }

    pub fn set_exists(mut self, v: bool) -> Self {
        self.exists = Some(v);
        self
    }

    pub fn set_comparison_operator(mut self, v: ComparisonOperator) -> Self {
        self.comparison_operator = Some(v);
        self
    }

    pub fn set_attribute_value_list<I>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = AttributeValue>,
    {
        self.attribute_value_list = Some(v.into_iter().collect());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeAction {
    Add,
    #[default]
    Put,
    Delete,
}

/// A change to one attribute in an `UpdateItem` request.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct AttributeValueUpdate {
    pub value: Option<AttributeValue>,
    pub action: Option<AttributeAction>,
}

impl AttributeValueUpdate {
    /// Replaces the attribute with `value`.
    pub fn put(value: AttributeValue) -> Self {
        Self {
            value: Some(value),
            action: Some(AttributeAction::Put),
        }
    }

    /// Removes the attribute.
    pub fn delete() -> Self {
        Self {
            value: None,
            action: Some(AttributeAction::Delete),
        }
    }
}

/// Which attributes, if any, a write operation returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnValue {
    #[default]
    None,
    AllOld,
    UpdatedOld,
    AllNew,
    UpdatedNew,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct PutItemInput {
    pub table_name: String,
    pub item: Item,
    pub expected: Option<HashMap<String, ExpectedAttributeValue>>,
    pub conditional_operator: Option<ConditionalOperator>,
    pub return_values: Option<ReturnValue>,
}

impl PutItemInput {
    pub fn new<T: Into<String>>(table_name: T, item: Item) -> Self {
        Self {
            table_name: table_name.into(),
            item,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
#[non_exhaustive]
pub struct PutItemOutput {
    pub attributes: Option<Item>,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct GetItemInput {
    pub table_name: String,
    pub key: Item,
    pub attributes_to_get: Option<Vec<String>>,
    pub consistent_read: Option<bool>,
}

impl GetItemInput {
    pub fn new<T: Into<String>>(table_name: T, key: Item) -> Self {
        Self {
            table_name: table_name.into(),
            key,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
#[non_exhaustive]
pub struct GetItemOutput {
    /// The item, absent if there is no item with the requested key.
    pub item: Option<Item>,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct UpdateItemInput {
    pub table_name: String,
    pub key: Item,
    pub attribute_updates: Option<HashMap<String, AttributeValueUpdate>>,
    pub expected: Option<HashMap<String, ExpectedAttributeValue>>,
    pub conditional_operator: Option<ConditionalOperator>,
    pub return_values: Option<ReturnValue>,
}

impl UpdateItemInput {
    pub fn new<T: Into<String>>(table_name: T, key: Item) -> Self {
        Self {
            table_name: table_name.into(),
            key,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
#[non_exhaustive]
pub struct UpdateItemOutput {
    pub attributes: Option<Item>,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct DeleteItemInput {
    pub table_name: String,
    pub key: Item,
    pub expected: Option<HashMap<String, ExpectedAttributeValue>>,
    pub conditional_operator: Option<ConditionalOperator>,
    pub return_values: Option<ReturnValue>,
}

impl DeleteItemInput {
    pub fn new<T: Into<String>>(table_name: T, key: Item) -> Self {
        Self {
            table_name: table_name.into(),
            key,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
#[non_exhaustive]
pub struct DeleteItemOutput {
    pub attributes: Option<Item>,
}
