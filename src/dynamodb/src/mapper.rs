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

//! Persists application records in the document store.
//!
//! Records are declared with the [document!][crate::document] macro. Each
//! field carries a tag describing how it maps to a store attribute:
//!
//! | Key | Meaning |
//! |---|---|
//! | `attr` | The attribute name. Empty uses the field name, `-` skips the field. |
//! | `key` | `hash` or `range`, if the attribute is part of the primary key. |
//! | `index` | The secondary indexes, separated by commas, using the attribute. |
//!
//! # Example
//! ```
//! stratus_dynamodb::document! {
//!     #[table("Users")]
//!     #[derive(Clone, Debug, Default, PartialEq)]
//!     pub struct User {
//!         #[attribute(r#"attr:"UserId" key:"hash""#)]
//!         pub id: String,
//!         #[attribute(r#"attr:"Email" index:"ByEmail""#)]
//!         pub email: String,
//!         #[attribute(r#"attr:"Age""#)]
//!         pub age: Option<u32>,
//!         #[attribute(r#"attr:"-""#)]
//!         pub session: String,
//!     }
//! }
//! use stratus_dynamodb::mapper::project;
//! let user = User { id: "u1".into(), ..Default::default() };
//! let projection = project(&user)?;
//! assert_eq!(projection.table, "Users");
//! assert_eq!(projection.hash_key, "UserId");
//! assert!(projection.attributes["Email"].is_empty());
//! assert!(!projection.attributes.contains_key("session"));
//! # Ok::<(), stratus_dynamodb::mapper::Error>(())
//! ```

mod field;
mod schema;

pub use field::AttributeField;
pub use schema::{FieldSchema, KeyRole, Schema, SchemaError};

use crate::client::DocumentStore;
use crate::model::*;
use std::collections::HashMap;
use std::sync::Arc;

/// The errors reported by the mapper.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The record's tags are invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A key attribute has no value.
    #[error("the key attribute {0:?} is empty")]
    EmptyKey(String),
    /// A stored attribute cannot be converted to the field's type.
    #[error("cannot restore attribute {name:?}: {reason}")]
    Attribute { name: String, reason: String },
    /// The document store request failed.
    #[error(transparent)]
    Store(#[from] gax::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Implemented by records declared with [document!][crate::document].
///
/// The implementation exposes the fields positionally, in declaration order,
/// matching [Schema::fields].
pub trait Document: Default + Send + Sync {
    /// The schema, parsed from the field tags on first use.
    fn schema() -> std::result::Result<&'static Schema, SchemaError>;

    /// The attribute values of every field, in declaration order.
    fn attribute_values(&self) -> Vec<AttributeValue>;

    /// Sets the field at `position` from a stored attribute.
    fn set_attribute_value(
        &mut self,
        position: usize,
        value: &AttributeValue,
    ) -> std::result::Result<(), String>;
}

/// The store's view of a record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelProjection {
    pub table: String,
    pub hash_key: String,
    pub range_key: Option<String>,
    /// Every modeled attribute, including empty ones.
    pub attributes: Item,
}

impl ModelProjection {
    /// The primary key of the record.
    ///
    /// The range key is only included if it has a value.
    pub fn key(&self) -> Result<Item> {
        let mut key = Item::new();
        match self.attributes.get(&self.hash_key) {
            Some(v) if !v.is_empty() => {
                key.insert(self.hash_key.clone(), v.clone());
            }
            _ => return Err(Error::EmptyKey(self.hash_key.clone())),
        }
        if let Some(range_key) = &self.range_key {
            if let Some(v) = self.attributes.get(range_key).filter(|v| !v.is_empty()) {
                key.insert(range_key.clone(), v.clone());
            }
        }
        Ok(key)
    }

    fn is_key(&self, name: &str) -> bool {
        name == self.hash_key || self.range_key.as_deref() == Some(name)
    }

    fn non_empty(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter().filter(|(_, v)| !v.is_empty())
    }
}

/// Projects `record` into the store's attribute model.
pub fn project<T: Document>(record: &T) -> Result<ModelProjection> {
    let schema = T::schema()?;
    let attributes = schema
        .fields()
        .iter()
        .zip(record.attribute_values())
        .filter_map(|(f, v)| f.as_ref().map(|f| (f.name().to_string(), v)))
        .collect();
    Ok(ModelProjection {
        table: schema.table().to_string(),
        hash_key: schema.hash_key().name().to_string(),
        range_key: schema.range_key().map(|f| f.name().to_string()),
        attributes,
    })
}

/// Populates `record` from stored `attributes`.
///
/// Fields without a stored attribute are left unchanged. Stored attributes
/// without a field are ignored.
pub fn restore<T: Document>(record: &mut T, attributes: &Item) -> Result<()> {
    let schema = T::schema()?;
    for (position, field) in schema.fields().iter().enumerate() {
        let Some(field) = field else {
            continue;
        };
        let Some(value) = attributes.get(field.name()) else {
            continue;
        };
        record
            .set_attribute_value(position, value)
            .map_err(|reason| Error::Attribute {
                name: field.name().to_string(),
                reason,
            })?;
    }
    Ok(())
}

/// How [DocumentMapper::save] writes records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveBehavior {
    /// Replaces the stored item. Attributes without a value are removed.
    #[default]
    ReplaceAll,
    /// Updates the modeled attributes. Attributes without a value are
    /// removed, attributes not in the record are unchanged.
    Update,
    /// Updates the modeled attributes that have a value. Other attributes
    /// are unchanged.
    UpdateSkipEmpty,
}

/// The consistency of [DocumentMapper::load].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsistentReads {
    #[default]
    Eventual,
    Consistent,
}

/// Configures a [DocumentMapper].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapperConfig {
    save_behavior: SaveBehavior,
    consistent_reads: ConsistentReads,
}

impl MapperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_behavior(&self) -> SaveBehavior {
        self.save_behavior
    }

    pub fn set_save_behavior(mut self, v: SaveBehavior) -> Self {
        self.save_behavior = v;
        self
    }

    pub fn consistent_reads(&self) -> ConsistentReads {
        self.consistent_reads
    }

    pub fn set_consistent_reads(mut self, v: ConsistentReads) -> Self {
        self.consistent_reads = v;
        self
    }
}

/// Conditions on the stored item for a save or delete.
///
/// # Example
/// ```
/// # use stratus_dynamodb::mapper::Expression;
/// # use stratus_dynamodb::model::*;
/// let expression = Expression::new()
///     .set_conditional_operator(ConditionalOperator::Or)
///     .add_expected("Version", ExpectedAttributeValue::default().set_exists(false))
///     .add_expected(
///         "Version",
///         ExpectedAttributeValue::default().set_value(AttributeValue::N("3".into())),
///     );
/// assert_eq!(expression.expected().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    conditional_operator: Option<ConditionalOperator>,
    expected: HashMap<String, ExpectedAttributeValue>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditional_operator(&self) -> Option<ConditionalOperator> {
        self.conditional_operator
    }

    pub fn set_conditional_operator(mut self, v: ConditionalOperator) -> Self {
        self.conditional_operator = Some(v);
        self
    }

    pub fn expected(&self) -> &HashMap<String, ExpectedAttributeValue> {
        &self.expected
    }

    /// Adds a condition on `name`, replacing any previous condition on it.
    pub fn add_expected<K: Into<String>>(mut self, name: K, v: ExpectedAttributeValue) -> Self {
        self.expected.insert(name.into(), v);
        self
    }

    fn parts(
        expression: Option<&Expression>,
    ) -> (
        Option<HashMap<String, ExpectedAttributeValue>>,
        Option<ConditionalOperator>,
    ) {
        match expression {
            None => (None, None),
            Some(e) => (
                (!e.expected.is_empty()).then(|| e.expected.clone()),
                e.conditional_operator,
            ),
        }
    }
}

/// Saves, loads, and deletes records in a document store.
///
/// # Example
/// ```no_run
/// # use stratus_dynamodb::{client::Client, mapper::*};
/// stratus_dynamodb::document! {
///     #[table("Users")]
///     #[derive(Clone, Debug, Default, PartialEq)]
///     pub struct User {
///         #[attribute(r#"attr:"UserId" key:"hash""#)]
///         pub id: String,
///         #[attribute(r#"attr:"Name""#)]
///         pub name: String,
///     }
/// }
/// async fn sample(client: Client) -> anyhow::Result<()> {
///     let config = MapperConfig::new().set_save_behavior(SaveBehavior::UpdateSkipEmpty);
///     let mapper = DocumentMapper::new(client, config);
///     mapper.save(&User { id: "u1".into(), name: "Ada".into() }, None).await?;
///     let user = mapper.load(&User { id: "u1".into(), ..Default::default() }).await?;
///     println!("{user:?}");
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct DocumentMapper {
    store: Arc<dyn DocumentStore>,
    config: MapperConfig,
}

impl DocumentMapper {
    pub fn new<S: DocumentStore + 'static>(store: S, config: MapperConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    pub fn from_shared(store: Arc<dyn DocumentStore>, config: MapperConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Writes `record` using the configured [SaveBehavior].
    pub async fn save<T: Document>(
        &self,
        record: &T,
        expression: Option<&Expression>,
    ) -> Result<()> {
        let projection = project(record)?;
        let key = projection.key()?;
        let (expected, conditional_operator) = Expression::parts(expression);
        tracing::debug!(
            table = %projection.table,
            behavior = ?self.config.save_behavior,
            "saving document"
        );
        match self.config.save_behavior {
            SaveBehavior::ReplaceAll => {
                let item = projection
                    .non_empty()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let mut input = PutItemInput::new(&projection.table, item);
                input.expected = expected;
                input.conditional_operator = conditional_operator;
                self.store.put_item(input).await?;
            }
            SaveBehavior::Update | SaveBehavior::UpdateSkipEmpty => {
                let skip_empty = self.config.save_behavior == SaveBehavior::UpdateSkipEmpty;
                let updates = projection
                    .attributes
                    .iter()
                    .filter(|(k, _)| !projection.is_key(k))
                    .filter_map(|(k, v)| match (v.is_empty(), skip_empty) {
                        (false, _) => Some((k.clone(), AttributeValueUpdate::put(v.clone()))),
                        (true, false) => Some((k.clone(), AttributeValueUpdate::delete())),
                        (true, true) => None,
                    })
                    .collect::<HashMap<_, _>>();
                let mut input = UpdateItemInput::new(&projection.table, key);
                input.attribute_updates = (!updates.is_empty()).then_some(updates);
                input.expected = expected;
                input.conditional_operator = conditional_operator;
                self.store.update_item(input).await?;
            }
        }
        Ok(())
    }

    /// Reads the record with the same key as `template`.
    ///
    /// Returns `None` if there is no such record.
    pub async fn load<T: Document>(&self, template: &T) -> Result<Option<T>> {
        let projection = project(template)?;
        let mut input = GetItemInput::new(&projection.table, projection.key()?);
        if self.config.consistent_reads == ConsistentReads::Consistent {
            input.consistent_read = Some(true);
        }
        tracing::debug!(table = %projection.table, "loading document");
        let Some(item) = self.store.get_item(input).await?.item else {
            return Ok(None);
        };
        let mut record = T::default();
        restore(&mut record, &item)?;
        Ok(Some(record))
    }

    /// Deletes the record with the same key as `record`.
    pub async fn delete<T: Document>(
        &self,
        record: &T,
        expression: Option<&Expression>,
    ) -> Result<()> {
        let projection = project(record)?;
        let (expected, conditional_operator) = Expression::parts(expression);
        let mut input = DeleteItemInput::new(&projection.table, projection.key()?);
        input.expected = expected;
        input.conditional_operator = conditional_operator;
        tracing::debug!(table = %projection.table, "deleting document");
        self.store.delete_item(input).await?;
        Ok(())
    }
}

/// Declares a record and implements [Document][crate::mapper::Document] for
/// it.
///
/// The struct carries a `#[table("...")]` attribute first, naming its table.
/// Every field carries an `#[attribute("...")]` attribute with its tag,
/// placed before any other field attribute or doc comment. The field types
/// must implement [AttributeField][crate::mapper::AttributeField].
#[macro_export]
macro_rules! document {
    (
        #[table($table:literal)]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                #[attribute($tag:literal)]
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

        impl $crate::mapper::Document for $name {
            fn schema() -> ::std::result::Result<
                &'static $crate::mapper::Schema,
                $crate::mapper::SchemaError,
            > {
                static SCHEMA: ::std::sync::LazyLock<
                    ::std::result::Result<$crate::mapper::Schema, $crate::mapper::SchemaError>,
                > = ::std::sync::LazyLock::new(|| {
                    $crate::mapper::Schema::parse(
                        $table,
                        &[ $( (stringify!($field), $tag), )* ],
                    )
                });
                SCHEMA.as_ref().map_err(::std::clone::Clone::clone)
            }

            fn attribute_values(&self) -> ::std::vec::Vec<$crate::model::AttributeValue> {
                ::std::vec![
                    $( $crate::mapper::AttributeField::to_attribute(&self.$field), )*
                ]
            }

            #[allow(unused_variables, unused_mut)]
            fn set_attribute_value(
                &mut self,
                position: usize,
                value: &$crate::model::AttributeValue,
            ) -> ::std::result::Result<(), ::std::string::String> {
                let mut positions = 0_usize..;
                $(
                    if positions.next() == Some(position) {
                        return $crate::mapper::AttributeField::from_attribute(
                            &mut self.$field,
                            value,
                        );
                    }
                )*
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use gax::error::ServiceError;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    crate::document! {
        #[table("Users")]
        #[derive(Clone, Debug, Default, PartialEq)]
        struct User {
            #[attribute(r#"attr:"UserId" key:"hash""#)]
            id: String,
            #[attribute(r#"attr:"Name""#)]
            name: String,
            #[attribute(r#"attr:"Email" index:"ByEmail""#)]
            email: String,
            #[attribute(r#"attr:"Age""#)]
            age: Option<u32>,
            #[attribute(r#"attr:"Admin""#)]
            admin: bool,
            #[attribute(r#"attr:"-""#)]
            session: String,
        }
    }

    crate::document! {
        #[table("Events")]
        #[derive(Clone, Debug, Default, PartialEq)]
        struct Event {
            #[attribute(r#"attr:"Stream" key:"hash""#)]
            stream: String,
            #[attribute(r#"attr:"Sequence" key:"range""#)]
            sequence: Option<i64>,
            #[attribute(r#"attr:"Payload""#)]
            payload: Bytes,
            #[attribute(r#"attr:"Labels""#)]
            labels: BTreeSet<String>,
            #[attribute(r#"attr:"Score""#)]
            score: f64,
        }
    }

    crate::document! {
        #[table("Broken")]
        #[derive(Clone, Debug, Default)]
        struct Broken {
            #[attribute(r#"attr:"Id" kye:"hash""#)]
            id: String,
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        Store {}
        #[async_trait::async_trait]
        impl DocumentStore for Store {
            async fn put_item(&self, input: PutItemInput) -> gax::Result<PutItemOutput>;
            async fn get_item(&self, input: GetItemInput) -> gax::Result<GetItemOutput>;
            async fn update_item(&self, input: UpdateItemInput) -> gax::Result<UpdateItemOutput>;
            async fn delete_item(&self, input: DeleteItemInput) -> gax::Result<DeleteItemOutput>;
        }
    }

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: String::new(),
            age: Some(36),
            admin: true,
            session: "ignored".into(),
        }
    }

    fn mapper(store: MockStore, save_behavior: SaveBehavior) -> DocumentMapper {
        DocumentMapper::new(
            store,
            MapperConfig::new().set_save_behavior(save_behavior),
        )
    }

    #[test]
    fn projection() -> anyhow::Result<()> {
        let got = project(&user())?;
        let want = ModelProjection {
            table: "Users".into(),
            hash_key: "UserId".into(),
            range_key: None,
            attributes: Item::from([
                ("UserId".into(), s("u1")),
                ("Name".into(), s("Ada")),
                ("Email".into(), s("")),
                ("Age".into(), n("36")),
                ("Admin".into(), n("1")),
            ]),
        };
        assert_eq!(got, want);
        Ok(())
    }

    #[test]
    fn projection_range_key() -> anyhow::Result<()> {
        let event = Event {
            stream: "s".into(),
            sequence: Some(7),
            payload: Bytes::from_static(b"abc"),
            labels: BTreeSet::from(["a".to_string()]),
            score: 0.5,
        };
        let got = project(&event)?;
        assert_eq!(got.range_key.as_deref(), Some("Sequence"));
        assert_eq!(
            got.key()?,
            Item::from([("Stream".into(), s("s")), ("Sequence".into(), n("7"))])
        );
        assert_eq!(got.attributes["Payload"], AttributeValue::B(Bytes::from_static(b"abc")));
        assert_eq!(got.attributes["Labels"], AttributeValue::Ss(vec!["a".into()]));
        assert_eq!(got.attributes["Score"], n("0.5"));
        Ok(())
    }

    #[test]
    fn restore_fields() -> anyhow::Result<()> {
        let mut got = User::default();
        restore(
            &mut got,
            &Item::from([
                ("UserId".into(), s("u1")),
                ("Name".into(), s("Ada")),
                ("Age".into(), n("36")),
                ("Admin".into(), n("1")),
                ("Unknown".into(), s("ignored")),
            ]),
        )?;
        let want = User {
            email: String::new(),
            session: String::new(),
            ..user()
        };
        assert_eq!(got, want);
        Ok(())
    }

    #[test]
    fn restore_type_mismatch() {
        let mut got = User::default();
        let err = restore(&mut got, &Item::from([("Age".into(), s("old"))])).unwrap_err();
        assert!(
            matches!(&err, Error::Attribute { name, .. } if name == "Age"),
            "{err:?}"
        );
    }

    #[test]
    fn invalid_schema() {
        let err = project(&Broken::default()).unwrap_err();
        assert!(matches!(err, Error::Schema(_)), "{err:?}");
    }

    #[tokio::test]
    async fn save_replace_all_omits_empty() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_put_item()
            .times(1)
            .withf(|input| {
                input.table_name == "Users"
                    && !input.item.contains_key("Email")
                    && input.item.get("Name") == Some(&s("Ada"))
                    && input.item.get("UserId") == Some(&s("u1"))
                    && input.expected.is_none()
            })
            .returning(|_| Ok(PutItemOutput::default()));
        mapper(store, SaveBehavior::ReplaceAll)
            .save(&user(), None)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_update_removes_empty() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_update_item()
            .times(1)
            .withf(|input| {
                let Some(updates) = &input.attribute_updates else {
                    return false;
                };
                input.key == Item::from([("UserId".into(), s("u1"))])
                    && updates.get("Email") == Some(&AttributeValueUpdate::delete())
                    && updates.get("Name") == Some(&AttributeValueUpdate::put(s("Ada")))
                    && !updates.contains_key("UserId")
            })
            .returning(|_| Ok(UpdateItemOutput::default()));
        mapper(store, SaveBehavior::Update).save(&user(), None).await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_update_skip_empty() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_update_item()
            .times(1)
            .withf(|input| {
                let Some(updates) = &input.attribute_updates else {
                    return false;
                };
                !updates.contains_key("Email")
                    && !updates.contains_key("UserId")
                    && updates.get("Age") == Some(&AttributeValueUpdate::put(n("36")))
            })
            .returning(|_| Ok(UpdateItemOutput::default()));
        mapper(store, SaveBehavior::UpdateSkipEmpty)
            .save(&user(), None)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_with_expression() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_put_item()
            .times(1)
            .withf(|input| {
                input.conditional_operator == Some(ConditionalOperator::Or)
                    && input.expected
                        == Some(HashMap::from([(
                            "UserId".to_string(),
                            ExpectedAttributeValue::default().set_exists(false),
                        )]))
            })
            .returning(|_| Ok(PutItemOutput::default()));
        let expression = Expression::new()
            .set_conditional_operator(ConditionalOperator::Or)
            .add_expected("UserId", ExpectedAttributeValue::default().set_exists(false));
        mapper(store, SaveBehavior::ReplaceAll)
            .save(&user(), Some(&expression))
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_empty_hash_key() {
        let store = MockStore::new();
        let record = User {
            id: String::new(),
            ..user()
        };
        let err = mapper(store, SaveBehavior::ReplaceAll)
            .save(&record, None)
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::EmptyKey(k) if k == "UserId"), "{err:?}");
    }

    #[tokio::test]
    async fn save_service_error() {
        let mut store = MockStore::new();
        store.expect_put_item().times(1).returning(|_| {
            Err(gax::error::Error::service(
                ServiceError::default()
                    .set_code(400_u16)
                    .set_kind("ConditionalCheckFailedException"),
            ))
        });
        let err = mapper(store, SaveBehavior::ReplaceAll)
            .save(&user(), None)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::Store(e) if e.kind() == "ConditionalCheckFailedException"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn load_by_hash_key() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .times(1)
            .withf(|input| {
                input.table_name == "Users"
                    && input.key == Item::from([("UserId".into(), s("u1"))])
                    && input.consistent_read.is_none()
            })
            .returning(|_| {
                let mut output = GetItemOutput::default();
                output.item = Some(Item::from([
                    ("UserId".into(), s("u1")),
                    ("Name".into(), s("Ada")),
                ]));
                Ok(output)
            });
        let template = User {
            id: "u1".into(),
            ..Default::default()
        };
        let got = mapper(store, SaveBehavior::ReplaceAll).load(&template).await?;
        let want = User {
            id: "u1".into(),
            name: "Ada".into(),
            ..Default::default()
        };
        assert_eq!(got, Some(want));
        Ok(())
    }

    #[tokio::test]
    async fn load_by_hash_and_range_key() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .times(1)
            .withf(|input| {
                input.key == Item::from([("Stream".into(), s("s")), ("Sequence".into(), n("3"))])
            })
            .returning(|_| Ok(GetItemOutput::default()));
        let template = Event {
            stream: "s".into(),
            sequence: Some(3),
            ..Default::default()
        };
        let got = mapper(store, SaveBehavior::ReplaceAll).load(&template).await?;
        assert_eq!(got, None);
        Ok(())
    }

    #[tokio::test]
    async fn load_hash_key_only_when_range_is_empty() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .times(1)
            .withf(|input| input.key == Item::from([("Stream".into(), s("s"))]))
            .returning(|_| Ok(GetItemOutput::default()));
        let template = Event {
            stream: "s".into(),
            ..Default::default()
        };
        let got = mapper(store, SaveBehavior::ReplaceAll).load(&template).await?;
        assert_eq!(got, None);
        Ok(())
    }

    #[tokio::test]
    async fn load_consistent() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_get_item()
            .times(1)
            .withf(|input| input.consistent_read == Some(true))
            .returning(|_| Ok(GetItemOutput::default()));
        let mapper = DocumentMapper::new(
            store,
            MapperConfig::new().set_consistent_reads(ConsistentReads::Consistent),
        );
        assert_eq!(mapper.config().consistent_reads(), ConsistentReads::Consistent);
        let got = mapper.load(&user()).await?;
        assert_eq!(got, None);
        Ok(())
    }

    #[tokio::test]
    async fn delete() -> anyhow::Result<()> {
        let mut store = MockStore::new();
        store
            .expect_delete_item()
            .times(1)
            .withf(|input| {
                input.table_name == "Users"
                    && input.key == Item::from([("UserId".into(), s("u1"))])
                    && input.conditional_operator.is_none()
                    && input
                        .expected
                        .as_ref()
                        .is_some_and(|e| e.contains_key("Name"))
            })
            .returning(|_| Ok(DeleteItemOutput::default()));
        let expression = Expression::new().add_expected(
            "Name",
            ExpectedAttributeValue::default().set_value(s("Ada")),
        );
        mapper(store, SaveBehavior::ReplaceAll)
            .delete(&user(), Some(&expression))
            .await?;
        Ok(())
    }
}
