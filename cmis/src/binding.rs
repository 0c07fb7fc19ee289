//! Remote service capabilities consumed by the session.
//!
//! A binding translates these calls to a concrete wire protocol (AtomPub,
//! browser or web services). Where the protocol uses object-id
//! out-parameters, the binding returns the id the server reported instead.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::acl::Acl;
use crate::content::ContentStream;
use crate::context::{IncludeRelationships, OperationContext};
use crate::object::{property_ids, VersioningState};
use crate::property::{TypeDefinition, Value};

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the remote repository or the transport.
#[derive(Debug, Error)]
pub enum Error {
    #[error("operation not supported: {0}")]
    NotSupported(String),
    #[error("content already exists: {0}")]
    ContentAlreadyExists(String),
    #[error("update conflict: {0}")]
    UpdateConflict(String),
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("versioning error: {0}")]
    Versioning(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// The wire protocol a binding speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingType {
    AtomPub,
    Browser,
    WebServices,
    Local,
}

/// Protocol version implemented by a repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CmisVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
}

impl fmt::Display for CmisVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_0 => f.write_str("1.0"),
            Self::V1_1 => f.write_str("1.1"),
        }
    }
}

/// When content may be replaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentStreamUpdatability {
    None,
    #[default]
    Anytime,
    PwcOnly,
}

/// Repository capabilities relevant to this client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub content_stream_updatability: ContentStreamUpdatability,
    /// Whether the server can clone a document in a single call.
    pub create_document_from_source: bool,
    pub pwc_updatable: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            content_stream_updatability: ContentStreamUpdatability::Anytime,
            create_document_from_source: true,
            pwc_updatable: true,
        }
    }
}

/// Operations that are only available on some repositories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Appending to a content stream. Requires CMIS 1.1.
    AppendContentStream,
    /// Server-side document copy.
    CreateDocumentFromSource,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendContentStream => f.write_str("appendContentStream"),
            Self::CreateDocumentFromSource => f.write_str("createDocumentFromSource"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cmis_version: CmisVersion,
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl RepositoryInfo {
    /// Whether the repository advertises the given feature.
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::AppendContentStream => self.cmis_version >= CmisVersion::V1_1,
            Feature::CreateDocumentFromSource => self.capabilities.create_document_from_source,
        }
    }
}

/// A property as transferred over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    pub id: String,
    pub values: Vec<Value>,
}

impl PropertyData {
    pub fn new(id: impl ToString, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            id: id.to_string(),
            values: values.into_iter().collect(),
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionData {
    pub stream_id: String,
    pub mime_type: Option<String>,
    pub length: Option<u64>,
    pub kind: Option<String>,
    pub title: Option<String>,
}

/// An object as transferred over the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub properties: Vec<PropertyData>,
    #[serde(default)]
    pub allowable_actions: Option<BTreeSet<String>>,
    #[serde(default)]
    pub acl: Option<Acl>,
    #[serde(default)]
    pub policy_ids: Option<Vec<String>>,
    #[serde(default)]
    pub renditions: Vec<RenditionData>,
}

impl ObjectData {
    pub fn property(&self, id: &str) -> Option<&PropertyData> {
        self.properties.iter().find(|p| p.id == id)
    }

    fn str_property(&self, id: &str) -> Option<&str> {
        self.property(id).and_then(|p| p.first()).and_then(Value::as_str)
    }

    /// The object id, if the server returned it.
    pub fn id(&self) -> Option<&str> {
        self.str_property(property_ids::OBJECT_ID)
    }

    /// The object type id, if the server returned it.
    pub fn type_id(&self) -> Option<&str> {
        self.str_property(property_ids::OBJECT_TYPE_ID)
    }
}

/// Parameters shaping what a fetch returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fetch<'a> {
    pub filter: Option<&'a str>,
    pub include_allowable_actions: bool,
    pub include_relationships: IncludeRelationships,
    pub rendition_filter: Option<&'a str>,
    pub include_policy_ids: bool,
    pub include_acl: bool,
}

impl<'a> From<&'a OperationContext> for Fetch<'a> {
    fn from(ctx: &'a OperationContext) -> Self {
        Self {
            filter: ctx.filter_str(),
            include_allowable_actions: ctx.include_allowable_actions,
            include_relationships: ctx.include_relationships,
            rendition_filter: ctx.rendition_filter_str(),
            include_policy_ids: ctx.include_policies,
            include_acl: ctx.include_acls,
        }
    }
}

/// Create a document.
#[derive(Debug, Default)]
pub struct CreateDocument {
    pub properties: Vec<PropertyData>,
    pub folder_id: Option<String>,
    pub content_stream: Option<ContentStream>,
    pub versioning_state: Option<VersioningState>,
    pub policies: Vec<String>,
    pub add_aces: Option<Acl>,
    pub remove_aces: Option<Acl>,
}

/// Create a document by server-side copy of an existing one.
#[derive(Debug, Default)]
pub struct CreateDocumentFromSource {
    pub source_id: String,
    pub properties: Vec<PropertyData>,
    pub folder_id: Option<String>,
    pub versioning_state: Option<VersioningState>,
    pub policies: Vec<String>,
    pub add_aces: Option<Acl>,
    pub remove_aces: Option<Acl>,
}

/// Check in a private working copy.
#[derive(Debug, Default)]
pub struct CheckIn {
    pub major: bool,
    pub properties: Vec<PropertyData>,
    pub content_stream: Option<ContentStream>,
    pub comment: Option<String>,
    pub policies: Vec<String>,
    pub add_aces: Option<Acl>,
    pub remove_aces: Option<Acl>,
}

pub trait RepositoryService: Send + Sync {
    /// Get information about all repositories served by this endpoint.
    fn get_repository_infos(&self) -> Result<Vec<RepositoryInfo>>;

    fn get_repository_info(&self, repository_id: &str) -> Result<RepositoryInfo>;

    fn get_type_definition(&self, repository_id: &str, type_id: &str) -> Result<TypeDefinition>;
}

pub trait ObjectService: Send + Sync {
    fn get_object(&self, repository_id: &str, object_id: &str, fetch: Fetch<'_>)
        -> Result<ObjectData>;

    /// Create a document, returning its id.
    fn create_document(&self, repository_id: &str, create: CreateDocument) -> Result<String>;

    /// Copy a document on the server, returning the id of the copy.
    fn create_document_from_source(
        &self,
        repository_id: &str,
        create: CreateDocumentFromSource,
    ) -> Result<String>;

    /// Replace the content of a document. Returns the id reported by the
    /// server, which differs from `object_id` when the repository creates a
    /// new version on content change.
    fn set_content_stream(
        &self,
        repository_id: &str,
        object_id: &str,
        change_token: Option<&str>,
        stream: ContentStream,
        overwrite: bool,
    ) -> Result<Option<String>>;

    fn append_content_stream(
        &self,
        repository_id: &str,
        object_id: &str,
        change_token: Option<&str>,
        stream: ContentStream,
        is_last_chunk: bool,
    ) -> Result<Option<String>>;

    fn delete_content_stream(
        &self,
        repository_id: &str,
        object_id: &str,
        change_token: Option<&str>,
    ) -> Result<Option<String>>;

    /// Get the primary content, or the rendition identified by `stream_id`.
    /// `offset` and `length` select a byte range.
    fn get_content_stream(
        &self,
        repository_id: &str,
        object_id: &str,
        stream_id: Option<&str>,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<ContentStream>;

    fn delete_object(&self, repository_id: &str, object_id: &str, all_versions: bool)
        -> Result<()>;
}

pub trait VersioningService: Send + Sync {
    /// Check out a document. Returns the id of the private working copy.
    fn check_out(&self, repository_id: &str, object_id: &str) -> Result<Option<String>>;

    fn cancel_check_out(&self, repository_id: &str, object_id: &str) -> Result<()>;

    /// Check in a private working copy. Returns the id of the new version.
    fn check_in(
        &self,
        repository_id: &str,
        object_id: &str,
        check_in: CheckIn,
    ) -> Result<Option<String>>;

    /// Get all versions of a version series, latest first.
    fn get_all_versions(
        &self,
        repository_id: &str,
        object_id: &str,
        version_series_id: Option<&str>,
        filter: Option<&str>,
        include_allowable_actions: bool,
    ) -> Result<Vec<ObjectData>>;

    fn get_object_of_latest_version(
        &self,
        repository_id: &str,
        object_id: &str,
        version_series_id: Option<&str>,
        major: bool,
        fetch: Fetch<'_>,
    ) -> Result<ObjectData>;
}

/// A connection to a CMIS endpoint.
pub trait RepositoryBinding: Send + Sync {
    fn binding_type(&self) -> BindingType;

    fn repository_service(&self) -> &dyn RepositoryService;

    fn object_service(&self) -> &dyn ObjectService;

    fn versioning_service(&self) -> &dyn VersioningService;

    /// Whether the binding itself can carry out the given feature,
    /// independent of what the repository advertises.
    fn supports(&self, feature: Feature) -> bool {
        match (self.binding_type(), feature) {
            (BindingType::AtomPub, Feature::CreateDocumentFromSource) => false,
            _ => true,
        }
    }
}
