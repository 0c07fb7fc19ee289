use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use std::{fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::acl::Acl;
use crate::binding::RenditionData;
use crate::context::OperationContext;
use crate::property::{Properties, TypeDefinition};

/// Well-known property identifiers.
pub mod property_ids {
    pub const OBJECT_ID: &str = "cmis:objectId";
    pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
    pub const BASE_TYPE_ID: &str = "cmis:baseTypeId";
    pub const NAME: &str = "cmis:name";
    pub const CREATED_BY: &str = "cmis:createdBy";
    pub const CREATION_DATE: &str = "cmis:creationDate";
    pub const LAST_MODIFIED_BY: &str = "cmis:lastModifiedBy";
    pub const LAST_MODIFICATION_DATE: &str = "cmis:lastModificationDate";
    pub const CHANGE_TOKEN: &str = "cmis:changeToken";

    pub const IS_IMMUTABLE: &str = "cmis:isImmutable";
    pub const IS_LATEST_VERSION: &str = "cmis:isLatestVersion";
    pub const IS_MAJOR_VERSION: &str = "cmis:isMajorVersion";
    pub const IS_LATEST_MAJOR_VERSION: &str = "cmis:isLatestMajorVersion";
    pub const IS_PRIVATE_WORKING_COPY: &str = "cmis:isPrivateWorkingCopy";
    pub const VERSION_LABEL: &str = "cmis:versionLabel";
    pub const VERSION_SERIES_ID: &str = "cmis:versionSeriesId";
    pub const IS_VERSION_SERIES_CHECKED_OUT: &str = "cmis:isVersionSeriesCheckedOut";
    pub const VERSION_SERIES_CHECKED_OUT_BY: &str = "cmis:versionSeriesCheckedOutBy";
    pub const VERSION_SERIES_CHECKED_OUT_ID: &str = "cmis:versionSeriesCheckedOutId";
    pub const CHECKIN_COMMENT: &str = "cmis:checkinComment";

    pub const CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";
    pub const CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
    pub const CONTENT_STREAM_FILE_NAME: &str = "cmis:contentStreamFileName";
    pub const CONTENT_STREAM_ID: &str = "cmis:contentStreamId";
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseObjectId {
    #[error("object id cannot be empty")]
    Empty,
}

/// Identifies a single, possibly versioned, repository object.
///
/// The value is opaque: two ids are equal iff their string values are.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ParseObjectId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Err(ParseObjectId::Empty);
        }
        Ok(Self(s))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl Deref for ObjectId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
#[error("unknown base type `{0}`")]
pub struct UnknownBaseType(String);

/// The base type every object type derives from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BaseType {
    Document,
    Folder,
    Relationship,
    Policy,
    Item,
    SecondaryType,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "cmis:document",
            Self::Folder => "cmis:folder",
            Self::Relationship => "cmis:relationship",
            Self::Policy => "cmis:policy",
            Self::Item => "cmis:item",
            Self::SecondaryType => "cmis:secondary",
        }
    }
}

impl FromStr for BaseType {
    type Err = UnknownBaseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cmis:document" => Ok(Self::Document),
            "cmis:folder" => Ok(Self::Folder),
            "cmis:relationship" => Ok(Self::Relationship),
            "cmis:policy" => Ok(Self::Policy),
            "cmis:item" => Ok(Self::Item),
            "cmis:secondary" => Ok(Self::SecondaryType),
            other => Err(UnknownBaseType(other.to_owned())),
        }
    }
}

impl TryFrom<String> for BaseType {
    type Error = UnknownBaseType;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BaseType> for &'static str {
    fn from(base: BaseType) -> Self {
        base.as_str()
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State a newly created document version starts out in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersioningState {
    /// The document is not versionable.
    None,
    /// The document is created as a major version.
    #[default]
    Major,
    /// The document is created as a minor version.
    Minor,
    /// The document is created checked out, ie. as a private working copy.
    CheckedOut,
}

/// Snapshot of a remote object, as of its last fetch.
///
/// Snapshots are shared between the session cache and the proxies handed
/// out to callers; a refresh replaces the snapshot rather than mutating it.
#[derive(Clone, Debug)]
pub struct Object {
    pub(crate) id: ObjectId,
    pub(crate) object_type: Arc<TypeDefinition>,
    pub(crate) properties: Properties,
    pub(crate) allowable_actions: Option<BTreeSet<String>>,
    pub(crate) acl: Option<Acl>,
    pub(crate) policy_ids: Option<Vec<ObjectId>>,
    pub(crate) renditions: Vec<RenditionData>,
    /// Context this snapshot was fetched with.
    pub(crate) context: Arc<OperationContext>,
    pub(crate) fetched_at: Instant,
}

impl Object {
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn object_type(&self) -> &TypeDefinition {
        &self.object_type
    }

    pub fn base_type(&self) -> BaseType {
        self.object_type.base_type
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn allowable_actions(&self) -> Option<&BTreeSet<String>> {
        self.allowable_actions.as_ref()
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    pub fn policy_ids(&self) -> Option<&[ObjectId]> {
        self.policy_ids.as_deref()
    }

    pub fn renditions(&self) -> &[RenditionData] {
        &self.renditions
    }

    pub fn context(&self) -> &Arc<OperationContext> {
        &self.context
    }

    /// When this snapshot was fetched.
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use pretty_assertions::assert_eq;
    use qcheck_macros::quickcheck;
    use serde_json as json;

    use super::*;

    #[quickcheck]
    fn prop_from_str(input: ObjectId) {
        let decoded = ObjectId::from_str(&input.to_string()).unwrap();

        assert_eq!(input, decoded);
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert_eq!(ObjectId::from_str(""), Err(ParseObjectId::Empty));
        assert!(json::from_str::<ObjectId>("\"\"").is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id = ObjectId::from_str("doc-1;1.0").unwrap();

        assert_eq!(json::to_string(&id).unwrap(), "\"doc-1;1.0\"");
        assert_eq!(json::from_str::<ObjectId>("\"doc-1;1.0\"").unwrap(), id);
    }

    #[test]
    fn test_base_type_str() {
        for base in [
            BaseType::Document,
            BaseType::Folder,
            BaseType::Relationship,
            BaseType::Policy,
            BaseType::Item,
            BaseType::SecondaryType,
        ] {
            assert_eq!(base.as_str().parse::<BaseType>().unwrap(), base);
        }
        assert!("cmis:unknown".parse::<BaseType>().is_err());
    }
}
