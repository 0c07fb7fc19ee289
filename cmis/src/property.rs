//! Property values and definitions.
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::{BaseType, ObjectId};

/// Milliseconds since the UNIX epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

/// The data type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Boolean,
    Id,
    Integer,
    DateTime,
    Decimal,
    Html,
    String,
    Uri,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Boolean => "boolean",
            Self::Id => "id",
            Self::Integer => "integer",
            Self::DateTime => "datetime",
            Self::Decimal => "decimal",
            Self::Html => "html",
            Self::String => "string",
            Self::Uri => "uri",
        };
        f.write_str(s)
    }
}

/// A single property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Value {
    Boolean(bool),
    Id(String),
    Integer(i64),
    DateTime(Timestamp),
    Decimal(f64),
    Html(String),
    String(String),
    Uri(String),
}

impl Value {
    /// The data type this value belongs to.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Id(_) => PropertyType::Id,
            Self::Integer(_) => PropertyType::Integer,
            Self::DateTime(_) => PropertyType::DateTime,
            Self::Decimal(_) => PropertyType::Decimal,
            Self::Html(_) => PropertyType::Html,
            Self::String(_) => PropertyType::String,
            Self::Uri(_) => PropertyType::Uri,
        }
    }

    /// Whether this value may be stored in a property of type `ty`.
    ///
    /// Plain strings are accepted for every string-like type.
    pub fn is_compatible(&self, ty: PropertyType) -> bool {
        match (self, ty) {
            (Self::String(_), PropertyType::Id | PropertyType::Html | PropertyType::Uri) => true,
            (value, ty) => value.property_type() == ty,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Id(s) | Self::Html(s) | Self::String(s) | Self::Uri(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::DateTime(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Self::Id(id.into())
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Self::DateTime(t)
    }
}

/// A set of properties, keyed by property id.
///
/// Single-valued properties hold exactly one value; an empty list means the
/// property is explicitly unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Vec<Value>>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued property.
    pub fn insert(&mut self, id: impl ToString, value: impl Into<Value>) -> &mut Self {
        self.0.insert(id.to_string(), vec![value.into()]);
        self
    }

    /// Set a multi-valued property.
    pub fn insert_all(
        &mut self,
        id: impl ToString,
        values: impl IntoIterator<Item = Value>,
    ) -> &mut Self {
        self.0.insert(id.to_string(), values.into_iter().collect());
        self
    }

    /// Builder variant of [`Properties::insert`].
    pub fn with(mut self, id: impl ToString, value: impl Into<Value>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&[Value]> {
        self.0.get(id).map(Vec::as_slice)
    }

    /// The first value of a property, if any.
    pub fn first(&self, id: &str) -> Option<&Value> {
        self.0.get(id).and_then(|vs| vs.first())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Vec<Value>> {
        self.0.remove(id)
    }

    /// Copy every property of `other` into `self`. Values in `other` win on
    /// key collision.
    pub fn overlay(&mut self, other: &Properties) {
        for (id, values) in other.iter() {
            self.0.insert(id.to_owned(), values.to_vec());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Properties {
    type Item = (String, Vec<Value>);
    type IntoIter = btree_map::IntoIter<String, Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: ToString> FromIterator<(K, Value)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

/// When a property may be submitted to the repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Updatability {
    /// Never set by clients.
    ReadOnly,
    /// May be set at any time.
    ReadWrite,
    /// May only be set when the object is created.
    OnCreate,
    /// May only be set on a private working copy.
    WhenCheckedOut,
}

impl fmt::Display for Updatability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReadOnly => "readonly",
            Self::ReadWrite => "readwrite",
            Self::OnCreate => "oncreate",
            Self::WhenCheckedOut => "whencheckedout",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    #[default]
    Single,
    Multi,
}

/// Describes one property of an object type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub id: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub cardinality: Cardinality,
    pub updatability: Updatability,
    #[serde(default)]
    pub required: bool,
}

impl PropertyDefinition {
    pub fn new(id: impl ToString, property_type: PropertyType, updatability: Updatability) -> Self {
        Self {
            id: id.to_string(),
            property_type,
            cardinality: Cardinality::Single,
            updatability,
            required: false,
        }
    }

    pub fn multi(mut self) -> Self {
        self.cardinality = Cardinality::Multi;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Whether documents of a type may carry content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentStreamAllowed {
    NotAllowed,
    #[default]
    Allowed,
    Required,
}

/// An object type, as returned by the repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub id: String,
    pub base_type: BaseType,
    #[serde(default)]
    pub versionable: bool,
    #[serde(default)]
    pub content_stream_allowed: ContentStreamAllowed,
    pub property_definitions: BTreeMap<String, PropertyDefinition>,
}

impl TypeDefinition {
    pub fn new(id: impl ToString, base_type: BaseType) -> Self {
        Self {
            id: id.to_string(),
            base_type,
            versionable: false,
            content_stream_allowed: ContentStreamAllowed::default(),
            property_definitions: BTreeMap::new(),
        }
    }

    pub fn versionable(mut self, versionable: bool) -> Self {
        self.versionable = versionable;
        self
    }

    pub fn property(mut self, def: PropertyDefinition) -> Self {
        self.property_definitions.insert(def.id.clone(), def);
        self
    }

    pub fn definition(&self, id: &str) -> Option<&PropertyDefinition> {
        self.property_definitions.get(id)
    }
}
