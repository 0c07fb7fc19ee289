//! Conversion between local representations and wire data.
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::acl::{Ace, Acl};
use crate::binding::{ObjectData, PropertyData};
use crate::content::ContentStream;
use crate::context::OperationContext;
use crate::object::{Object, ObjectId, ParseObjectId};
use crate::property::{Cardinality, Properties, PropertyType, TypeDefinition, Updatability};

/// Property and object conversion error.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("property `{id}` is not defined on type `{type_id}`")]
    UnknownProperty { id: String, type_id: String },
    #[error("property `{id}` is {updatability} and cannot be set here")]
    NotUpdatable {
        id: String,
        updatability: Updatability,
    },
    #[error("property `{id}` expects {expected} values")]
    TypeMismatch { id: String, expected: PropertyType },
    #[error("property `{id}` is single-valued, but {count} values were given")]
    Cardinality { id: String, count: usize },
    #[error("properties do not name an object type")]
    MissingObjectType,
    #[error("object data has no object id")]
    MissingId,
    #[error("object `{0}` has no object type")]
    MissingTypeId(String),
    #[error("invalid object id in object data: {0}")]
    ObjectId(#[from] ParseObjectId),
}

/// Converts between local objects and their wire representation.
#[derive(Clone, Debug, Default)]
pub struct ObjectFactory;

impl ObjectFactory {
    /// Convert local properties to wire properties.
    ///
    /// Every property must be defined on `ty`, be updatable in one of the
    /// given modes, and match its definition's type and cardinality.
    pub fn convert_properties(
        &self,
        properties: &Properties,
        ty: &TypeDefinition,
        updatability: &[Updatability],
    ) -> Result<Vec<PropertyData>, ConversionError> {
        let mut converted = Vec::with_capacity(properties.len());

        for (id, values) in properties.iter() {
            let def = ty
                .definition(id)
                .ok_or_else(|| ConversionError::UnknownProperty {
                    id: id.to_owned(),
                    type_id: ty.id.clone(),
                })?;

            if !updatability.contains(&def.updatability) {
                return Err(ConversionError::NotUpdatable {
                    id: id.to_owned(),
                    updatability: def.updatability,
                });
            }
            if def.cardinality == Cardinality::Single && values.len() > 1 {
                return Err(ConversionError::Cardinality {
                    id: id.to_owned(),
                    count: values.len(),
                });
            }
            if let Some(v) = values.iter().find(|v| !v.is_compatible(def.property_type)) {
                log::trace!(target: "cmis", "Rejecting {v:?} for property `{id}`");
                return Err(ConversionError::TypeMismatch {
                    id: id.to_owned(),
                    expected: def.property_type,
                });
            }
            converted.push(PropertyData::new(id, values.iter().cloned()));
        }
        Ok(converted)
    }

    /// Normalize a content stream for transfer.
    pub fn convert_content_stream(&self, stream: ContentStream) -> ContentStream {
        if stream.mime_type.is_some() {
            return stream;
        }
        let mime = stream.mime_type_or_default().to_owned();
        stream.with_mime_type(mime)
    }

    pub fn convert_policies(&self, policies: &[ObjectId]) -> Vec<String> {
        policies.iter().map(|p| p.to_string()).collect()
    }

    /// Convert a list of entries to an ACL. An empty list converts to no ACL.
    pub fn convert_aces(&self, aces: &[Ace]) -> Option<Acl> {
        if aces.is_empty() {
            return None;
        }
        Some(Acl {
            aces: aces.to_vec(),
            exact: false,
        })
    }

    /// Build a local object from wire data, fetched with `context`.
    pub fn convert_object(
        &self,
        data: ObjectData,
        ty: Arc<TypeDefinition>,
        context: Arc<OperationContext>,
    ) -> Result<Object, ConversionError> {
        let id = data
            .id()
            .ok_or(ConversionError::MissingId)?
            .parse::<ObjectId>()?;
        let policy_ids = data
            .policy_ids
            .map(|ids| {
                ids.into_iter()
                    .map(ObjectId::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let mut properties = Properties::new();
        for p in data.properties {
            properties.insert_all(p.id, p.values);
        }

        Ok(Object {
            id,
            object_type: ty,
            properties,
            allowable_actions: data.allowable_actions,
            acl: data.acl,
            policy_ids,
            renditions: data.renditions,
            context,
            fetched_at: Instant::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::object::property_ids;
    use crate::property::Value;
    use crate::test::fixtures;

    const CHECK_IN: &[Updatability] = &[Updatability::ReadWrite, Updatability::WhenCheckedOut];

    #[test]
    fn test_convert_properties() {
        let ty = fixtures::document_type();
        let props = Properties::new()
            .with(property_ids::NAME, "report.txt")
            .with(fixtures::PROP_REVIEWED_BY, "alice");

        let converted = ObjectFactory.convert_properties(&props, &ty, CHECK_IN).unwrap();

        assert_eq!(
            converted,
            vec![
                PropertyData::new(property_ids::NAME, [Value::from("report.txt")]),
                PropertyData::new(fixtures::PROP_REVIEWED_BY, [Value::from("alice")]),
            ]
        );
    }

    #[test]
    fn test_convert_properties_rejects_not_updatable() {
        let ty = fixtures::document_type();
        let props = Properties::new().with(fixtures::PROP_ORIGIN, "scanner");

        let err = ObjectFactory
            .convert_properties(&props, &ty, CHECK_IN)
            .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::NotUpdatable {
                updatability: Updatability::OnCreate,
                ..
            }
        ));
    }

    #[test]
    fn test_convert_properties_rejects_unknown_and_mismatched() {
        let ty = fixtures::document_type();

        let unknown = Properties::new().with("x:unknown", "value");
        assert!(matches!(
            ObjectFactory.convert_properties(&unknown, &ty, CHECK_IN),
            Err(ConversionError::UnknownProperty { .. })
        ));

        let mismatched = Properties::new().with(property_ids::NAME, true);
        assert!(matches!(
            ObjectFactory.convert_properties(&mismatched, &ty, CHECK_IN),
            Err(ConversionError::TypeMismatch { .. })
        ));

        let mut multi = Properties::new();
        multi.insert_all(property_ids::NAME, [Value::from("a"), Value::from("b")]);
        assert!(matches!(
            ObjectFactory.convert_properties(&multi, &ty, CHECK_IN),
            Err(ConversionError::Cardinality { count: 2, .. })
        ));
    }

    #[test]
    fn test_convert_aces() {
        assert_eq!(ObjectFactory.convert_aces(&[]), None);

        let ace = Ace::new("alice", ["cmis:read"]);
        let acl = ObjectFactory.convert_aces(&[ace.clone()]).unwrap();
        assert_eq!(acl.aces, vec![ace]);
    }

    #[test]
    fn test_convert_content_stream_default_mime() {
        let stream = ObjectFactory.convert_content_stream(ContentStream::from_bytes("abc"));
        assert_eq!(stream.mime_type.as_deref(), Some("application/octet-stream"));

        let stream = ObjectFactory
            .convert_content_stream(ContentStream::from_bytes("abc").with_mime_type("text/plain"));
        assert_eq!(stream.mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_convert_object_requires_id() {
        let ty = Arc::new(fixtures::document_type());
        let ctx = Arc::new(OperationContext::default());

        assert!(matches!(
            ObjectFactory.convert_object(ObjectData::default(), ty, ctx),
            Err(ConversionError::MissingId)
        ));
    }
}
