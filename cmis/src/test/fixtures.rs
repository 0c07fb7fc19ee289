use std::sync::Arc;

use crate::binding::RepositoryBinding;
use crate::config::Config;
use crate::object::{property_ids, BaseType};
use crate::property::{PropertyDefinition, PropertyType, TypeDefinition, Updatability};
use crate::session::Session;
use crate::test::binding::{MockBinding, REPOSITORY_ID};

/// Versionable document type.
pub const DOCUMENT_TYPE: &str = "cmis:document";
/// Document type without versioning.
pub const PLAIN_TYPE: &str = "test:plain";
pub const FOLDER_TYPE: &str = "cmis:folder";
/// Document type with system properties only.
pub const MINIMAL_TYPE: &str = "test:minimal";

/// Free-form note, settable at any time.
pub const PROP_NOTE: &str = "test:note";
/// Where the document came from. Only settable on create.
pub const PROP_ORIGIN: &str = "test:origin";
/// Server-computed digest.
pub const PROP_DIGEST: &str = "test:digest";
/// Reviewer. Only settable on a private working copy.
pub const PROP_REVIEWED_BY: &str = "test:reviewedBy";
pub const PROP_TAGS: &str = "test:tags";

fn system_properties(ty: TypeDefinition) -> TypeDefinition {
    use PropertyType::*;
    use Updatability::*;

    [
        (property_ids::OBJECT_ID, Id, ReadOnly),
        (property_ids::OBJECT_TYPE_ID, Id, OnCreate),
        (property_ids::BASE_TYPE_ID, Id, ReadOnly),
        (property_ids::NAME, String, ReadWrite),
        (property_ids::CREATED_BY, String, ReadOnly),
        (property_ids::LAST_MODIFIED_BY, String, ReadOnly),
        (property_ids::CHANGE_TOKEN, String, ReadOnly),
    ]
    .into_iter()
    .fold(ty, |ty, (id, kind, upd)| {
        ty.property(PropertyDefinition::new(id, kind, upd))
    })
}

fn document_properties(ty: TypeDefinition) -> TypeDefinition {
    use PropertyType::*;
    use Updatability::*;

    [
        (property_ids::IS_IMMUTABLE, Boolean, ReadOnly),
        (property_ids::IS_LATEST_VERSION, Boolean, ReadOnly),
        (property_ids::IS_MAJOR_VERSION, Boolean, ReadOnly),
        (property_ids::IS_LATEST_MAJOR_VERSION, Boolean, ReadOnly),
        (property_ids::IS_PRIVATE_WORKING_COPY, Boolean, ReadOnly),
        (property_ids::VERSION_LABEL, String, ReadOnly),
        (property_ids::VERSION_SERIES_ID, Id, ReadOnly),
        (property_ids::IS_VERSION_SERIES_CHECKED_OUT, Boolean, ReadOnly),
        (property_ids::VERSION_SERIES_CHECKED_OUT_BY, String, ReadOnly),
        (property_ids::VERSION_SERIES_CHECKED_OUT_ID, Id, ReadOnly),
        (property_ids::CHECKIN_COMMENT, String, ReadOnly),
        (property_ids::CONTENT_STREAM_LENGTH, Integer, ReadOnly),
        (property_ids::CONTENT_STREAM_MIME_TYPE, String, ReadOnly),
        (property_ids::CONTENT_STREAM_FILE_NAME, String, ReadOnly),
        (property_ids::CONTENT_STREAM_ID, Id, ReadOnly),
        (PROP_NOTE, String, ReadWrite),
        (PROP_ORIGIN, String, OnCreate),
        (PROP_DIGEST, String, ReadOnly),
        (PROP_REVIEWED_BY, String, WhenCheckedOut),
    ]
    .into_iter()
    .fold(system_properties(ty), |ty, (id, kind, upd)| {
        ty.property(PropertyDefinition::new(id, kind, upd))
    })
    .property(PropertyDefinition::new(PROP_TAGS, PropertyType::String, Updatability::ReadWrite).multi())
}

pub fn document_type() -> TypeDefinition {
    document_properties(TypeDefinition::new(DOCUMENT_TYPE, BaseType::Document).versionable(true))
}

pub fn plain_type() -> TypeDefinition {
    document_properties(TypeDefinition::new(PLAIN_TYPE, BaseType::Document).versionable(false))
}

pub fn minimal_type() -> TypeDefinition {
    system_properties(TypeDefinition::new(MINIMAL_TYPE, BaseType::Document).versionable(false))
}

pub fn folder_type() -> TypeDefinition {
    system_properties(TypeDefinition::new(FOLDER_TYPE, BaseType::Folder))
}

pub fn config() -> Config {
    Config::new(REPOSITORY_ID)
}

/// Open a caching session over a mock repository.
/// The binding is returned too, for inspection.
pub fn session(binding: MockBinding) -> (Arc<MockBinding>, Session) {
    let binding = Arc::new(binding);
    let session = Session::open(binding.clone() as Arc<dyn RepositoryBinding>, &config()).unwrap();

    (binding, session)
}
