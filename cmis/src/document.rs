//! Document proxies.
//!
//! A [`Document`] is a view of one version-series member as last fetched.
//! Every mutation is delegated to the repository; when the repository
//! reports a new object id, it is handed back to the caller instead of being
//! applied to the proxy, since a new id names a different object.
#![allow(clippy::too_many_arguments)]
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::acl::Ace;
use crate::binding::{CheckIn, Feature};
use crate::cache::{InMemory, ObjectCache};
use crate::content::ContentStream;
use crate::context::OperationContext;
use crate::error::Error;
use crate::object::{property_ids, BaseType, Object, ObjectId, VersioningState};
use crate::property::{Properties, Timestamp, Updatability, Value};
use crate::session::Session;

/// Updatability modes accepted when checking in.
const ON_CHECK_IN: &[Updatability] = &[Updatability::ReadWrite, Updatability::WhenCheckedOut];

/// How the result of a copy is resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Resolve {
    /// Fetch the copy with the session's default context.
    #[default]
    Default,
    /// Fetch the copy with the given context.
    With(OperationContext),
    /// Do not fetch the copy; [`Document::copy`] returns `None`.
    Skip,
}

/// Options for [`Document::copy`].
#[derive(Clone, Debug, Default)]
pub struct CopyOptions {
    /// Properties to set on the copy. These win over the source's values.
    pub properties: Properties,
    pub versioning_state: Option<VersioningState>,
    pub policies: Vec<ObjectId>,
    pub add_aces: Vec<Ace>,
    pub remove_aces: Vec<Ace>,
    pub resolve: Resolve,
}

/// A document in a repository, as last fetched.
pub struct Document<'s, C = InMemory<Object>> {
    session: &'s Session<C>,
    object: Arc<Object>,
}

impl<'s, C> Clone for Document<'s, C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            object: self.object.clone(),
        }
    }
}

impl<'s, C> fmt::Debug for Document<'s, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.object.id)
            .field("type", &self.object.object_type.id)
            .finish()
    }
}

impl<'s, C: ObjectCache> Document<'s, C> {
    pub(crate) fn new(session: &'s Session<C>, object: Arc<Object>) -> Result<Self, Error> {
        if object.base_type() != BaseType::Document {
            return Err(Error::NotADocument {
                id: object.id.clone(),
                base: object.base_type(),
            });
        }
        Ok(Self { session, object })
    }

    pub fn session(&self) -> &'s Session<C> {
        self.session
    }

    /// The snapshot backing this proxy.
    pub fn object(&self) -> &Arc<Object> {
        &self.object
    }

    pub fn id(&self) -> &ObjectId {
        &self.object.id
    }

    /// The context this proxy was fetched with.
    pub fn creation_context(&self) -> &OperationContext {
        &self.object.context
    }

    pub fn properties(&self) -> &Properties {
        &self.object.properties
    }

    pub fn property(&self, id: &str) -> Option<&[Value]> {
        self.object.properties.get(id)
    }

    pub fn is_versionable(&self) -> bool {
        self.object.object_type.versionable
    }

    fn str_property(&self, id: &str) -> Option<&str> {
        self.object.properties.first(id).and_then(Value::as_str)
    }

    fn bool_property(&self, id: &str) -> Option<bool> {
        self.object.properties.first(id).and_then(Value::as_bool)
    }

    fn timestamp_property(&self, id: &str) -> Option<Timestamp> {
        self.object.properties.first(id).and_then(Value::as_timestamp)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_property(property_ids::NAME)
    }

    pub fn base_type(&self) -> BaseType {
        self.object.base_type()
    }

    pub fn object_type_id(&self) -> &str {
        &self.object.object_type.id
    }

    pub fn change_token(&self) -> Option<&str> {
        self.str_property(property_ids::CHANGE_TOKEN)
    }

    pub fn created_by(&self) -> Option<&str> {
        self.str_property(property_ids::CREATED_BY)
    }

    pub fn creation_date(&self) -> Option<Timestamp> {
        self.timestamp_property(property_ids::CREATION_DATE)
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.str_property(property_ids::LAST_MODIFIED_BY)
    }

    pub fn last_modification_date(&self) -> Option<Timestamp> {
        self.timestamp_property(property_ids::LAST_MODIFICATION_DATE)
    }

    pub fn checkin_comment(&self) -> Option<&str> {
        self.str_property(property_ids::CHECKIN_COMMENT)
    }

    pub fn content_stream_file_name(&self) -> Option<&str> {
        self.str_property(property_ids::CONTENT_STREAM_FILE_NAME)
    }

    pub fn content_stream_mime_type(&self) -> Option<&str> {
        self.str_property(property_ids::CONTENT_STREAM_MIME_TYPE)
    }

    /// Content length in bytes. `None` if unknown or negative.
    pub fn content_stream_length(&self) -> Option<u64> {
        self.object
            .properties
            .first(property_ids::CONTENT_STREAM_LENGTH)
            .and_then(Value::as_integer)
            .and_then(|l| u64::try_from(l).ok())
    }

    pub fn content_stream_id(&self) -> Option<&str> {
        self.str_property(property_ids::CONTENT_STREAM_ID)
    }

    pub fn version_label(&self) -> Option<&str> {
        self.str_property(property_ids::VERSION_LABEL)
    }

    pub fn version_series_id(&self) -> Option<&str> {
        self.str_property(property_ids::VERSION_SERIES_ID)
    }

    pub fn version_series_checked_out_by(&self) -> Option<&str> {
        self.str_property(property_ids::VERSION_SERIES_CHECKED_OUT_BY)
    }

    pub fn version_series_checked_out_id(&self) -> Option<&str> {
        self.str_property(property_ids::VERSION_SERIES_CHECKED_OUT_ID)
    }

    pub fn is_latest_version(&self) -> Option<bool> {
        self.bool_property(property_ids::IS_LATEST_VERSION)
    }

    pub fn is_latest_major_version(&self) -> Option<bool> {
        self.bool_property(property_ids::IS_LATEST_MAJOR_VERSION)
    }

    pub fn is_major_version(&self) -> Option<bool> {
        self.bool_property(property_ids::IS_MAJOR_VERSION)
    }

    pub fn is_private_working_copy(&self) -> Option<bool> {
        self.bool_property(property_ids::IS_PRIVATE_WORKING_COPY)
    }

    pub fn is_immutable(&self) -> Option<bool> {
        self.bool_property(property_ids::IS_IMMUTABLE)
    }

    pub fn is_version_series_checked_out(&self) -> Option<bool> {
        self.bool_property(property_ids::IS_VERSION_SERIES_CHECKED_OUT)
    }

    /// Re-fetch this document with its creation context.
    pub fn refresh(&mut self) -> Result<(), Error> {
        self.object = self.session.load(&self.object.id, self.object.context.clone())?;

        Ok(())
    }

    /// Re-fetch this document if it was fetched longer than `max_age` ago.
    /// Returns whether a refresh happened.
    pub fn refresh_if_old(&mut self, max_age: Duration) -> Result<bool, Error> {
        if self.object.fetched_at.elapsed() < max_age {
            return Ok(false);
        }
        self.refresh()?;

        Ok(true)
    }

    /// Turn an id reported by the repository into an [`ObjectId`]. An absent
    /// or empty id means the repository did not report one.
    fn resolve_id(&self, reported: Option<String>) -> Result<Option<ObjectId>, Error> {
        reported
            .filter(|id| !id.is_empty())
            .map(|id| self.session.create_object_id(id))
            .transpose()
    }

    /// Replace the content of this document.
    ///
    /// With `overwrite` unset, the repository rejects the call if the
    /// document already has content. If `refresh` is set, this proxy is
    /// refreshed against its own id, not the returned one.
    ///
    /// Returns the id the repository reported, which differs from this
    /// document's id if the repository created a new version.
    pub fn set_content_stream(
        &mut self,
        stream: ContentStream,
        overwrite: bool,
        refresh: bool,
    ) -> Result<Option<ObjectId>, Error> {
        let id = self.object.id.clone();
        let change_token = self.change_token().map(ToOwned::to_owned);
        let stream = self.session.factory().convert_content_stream(stream);

        let reported = self.session.binding().object_service().set_content_stream(
            self.session.repository_id(),
            &id,
            change_token.as_deref(),
            stream,
            overwrite,
        )?;
        if refresh {
            self.refresh()?;
        }
        self.resolve_id(reported)
    }

    /// Append a chunk to the content of this document.
    ///
    /// Fails with [`Error::NotSupported`] before contacting the repository if
    /// it implements CMIS 1.0 only.
    pub fn append_content_stream(
        &mut self,
        stream: ContentStream,
        is_last_chunk: bool,
        refresh: bool,
    ) -> Result<Option<ObjectId>, Error> {
        self.session.ensure(Feature::AppendContentStream)?;

        let id = self.object.id.clone();
        let change_token = self.change_token().map(ToOwned::to_owned);
        let stream = self.session.factory().convert_content_stream(stream);

        let reported = self
            .session
            .binding()
            .object_service()
            .append_content_stream(
                self.session.repository_id(),
                &id,
                change_token.as_deref(),
                stream,
                is_last_chunk,
            )?;
        if refresh {
            self.refresh()?;
        }
        self.resolve_id(reported)
    }

    /// Remove the content of this document.
    ///
    /// If the repository reports an id, the contentless document is
    /// returned, fetched with this proxy's creation context. If `refresh` is
    /// set, this proxy is refreshed against its own id first.
    pub fn delete_content_stream(&mut self, refresh: bool) -> Result<Option<Document<'s, C>>, Error> {
        let id = self.object.id.clone();
        let change_token = self.change_token().map(ToOwned::to_owned);

        let reported = self
            .session
            .binding()
            .object_service()
            .delete_content_stream(self.session.repository_id(), &id, change_token.as_deref())?;
        if refresh {
            self.refresh()?;
        }
        let Some(id) = self.resolve_id(reported)? else {
            return Ok(None);
        };
        let context = self.object.context.clone();

        self.session.get_object(&id, &context).map(Some)
    }

    /// Get the primary content of this document.
    pub fn content_stream(&self) -> Result<Option<ContentStream>, Error> {
        self.get_content_stream(None, None, None)
    }

    /// Get the content of this document, or of the rendition identified by
    /// `stream_id`. `offset` and `length` select a byte range.
    pub fn get_content_stream(
        &self,
        stream_id: Option<&str>,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<Option<ContentStream>, Error> {
        self.session
            .get_content_stream(&self.object.id, stream_id, offset, length)
    }

    /// Check out this document, returning the id of the private working copy.
    /// This proxy is left untouched.
    pub fn check_out(&self) -> Result<Option<ObjectId>, Error> {
        let reported = self
            .session
            .binding()
            .versioning_service()
            .check_out(self.session.repository_id(), &self.object.id)?;

        self.resolve_id(reported)
    }

    /// Discard this private working copy and evict it from the cache.
    ///
    /// Calling this on a document that is not a private working copy is an
    /// error the repository reports.
    pub fn cancel_check_out(&self) -> Result<(), Error> {
        self.session
            .binding()
            .versioning_service()
            .cancel_check_out(self.session.repository_id(), &self.object.id)?;

        self.session.remove_object_from_cache(&self.object.id)
    }

    /// Check in this private working copy. See [`Document::check_in_with`].
    pub fn check_in(
        &self,
        major: bool,
        properties: &Properties,
        content_stream: Option<ContentStream>,
        comment: Option<&str>,
    ) -> Result<Option<ObjectId>, Error> {
        self.check_in_with(major, properties, content_stream, comment, &[], &[], &[])
    }

    /// Check in this private working copy, evicting it from the cache.
    ///
    /// Properties must be updatable as `readwrite` or `whencheckedout`.
    /// Returns the id of the new version, if the repository reported one.
    pub fn check_in_with(
        &self,
        major: bool,
        properties: &Properties,
        content_stream: Option<ContentStream>,
        comment: Option<&str>,
        policies: &[ObjectId],
        add_aces: &[Ace],
        remove_aces: &[Ace],
    ) -> Result<Option<ObjectId>, Error> {
        let factory = self.session.factory();
        let check_in = CheckIn {
            major,
            properties: factory.convert_properties(
                properties,
                &self.object.object_type,
                ON_CHECK_IN,
            )?,
            content_stream: content_stream.map(|s| factory.convert_content_stream(s)),
            comment: comment.map(ToOwned::to_owned),
            policies: factory.convert_policies(policies),
            add_aces: factory.convert_aces(add_aces),
            remove_aces: factory.convert_aces(remove_aces),
        };
        let reported = self.session.binding().versioning_service().check_in(
            self.session.repository_id(),
            &self.object.id,
            check_in,
        )?;
        self.session.remove_object_from_cache(&self.object.id)?;

        self.resolve_id(reported)
    }

    /// Get every version in this document's version series, latest first.
    pub fn all_versions(&self, context: &OperationContext) -> Result<Vec<Document<'s, C>>, Error> {
        let data = self.session.binding().versioning_service().get_all_versions(
            self.session.repository_id(),
            &self.object.id,
            self.version_series_id(),
            context.filter_str(),
            context.include_allowable_actions,
        )?;
        let context = Arc::new(context.clone());
        let mut versions = Vec::with_capacity(data.len());

        for d in data {
            let object = self.session.convert_object(d, context.clone())?;
            if object.base_type() != BaseType::Document {
                log::warn!(
                    target: "cmis",
                    "Skipping version `{}` of `{}`: not a document",
                    object.id,
                    self.object.id
                );
                continue;
            }
            versions.push(Document {
                session: self.session,
                object: Arc::new(object),
            });
        }
        Ok(versions)
    }

    /// Get the latest version, or latest major version, of this document's
    /// version series. A document that is not versionable is its own latest
    /// version.
    pub fn object_of_latest_version(
        &self,
        major: bool,
        context: &OperationContext,
    ) -> Result<Document<'s, C>, Error> {
        if !self.is_versionable() {
            return self.session.get_object(&self.object.id, context);
        }
        self.session.latest_version(
            &self.object.id,
            self.version_series_id().map(ToOwned::to_owned),
            major,
            context,
        )
    }

    /// Delete this document, or its whole version series.
    pub fn delete(&self, all_versions: bool) -> Result<(), Error> {
        self.session.delete(&self.object.id, all_versions)
    }

    /// Copy this document into `target_folder`.
    ///
    /// The copy is made on the server if possible, and otherwise by reading
    /// this document and creating a new one. The copy is then fetched as
    /// [`CopyOptions::resolve`] says; with [`Resolve::Skip`] this returns
    /// `None`. Use [`Document::copy_id`] to get the id in that case.
    pub fn copy(
        &self,
        target_folder: &ObjectId,
        options: CopyOptions,
    ) -> Result<Option<Document<'s, C>>, Error> {
        let id = self.copy_id(target_folder, &options)?;
        let context = match options.resolve {
            Resolve::Skip => return Ok(None),
            Resolve::Default => self.session.default_context().clone(),
            Resolve::With(context) => context,
        };
        self.session.get_object(&id, &context).map(Some)
    }

    /// Copy this document into `target_folder`, returning the id of the copy.
    pub fn copy_id(&self, target_folder: &ObjectId, options: &CopyOptions) -> Result<ObjectId, Error> {
        match self.session.create_document_from_source(
            self,
            &options.properties,
            Some(target_folder),
            options.versioning_state,
            &options.policies,
            &options.add_aces,
            &options.remove_aces,
        ) {
            Ok(id) => Ok(id),
            Err(e) if e.is_not_supported() => {
                log::debug!(
                    target: "cmis",
                    "Server-side copy of `{}` unavailable ({e}), copying via client",
                    self.object.id
                );
                self.copy_via_client(target_folder, options)
            }
            Err(e) => Err(e),
        }
    }

    /// Copy this document by reading it and creating a new document.
    ///
    /// Only properties that are `readwrite` or `oncreate` in the type of the
    /// copy are carried over; `options.properties` are applied on top. The
    /// type of the copy is the one set in `options.properties`, if any.
    pub fn copy_via_client(
        &self,
        target_folder: &ObjectId,
        options: &CopyOptions,
    ) -> Result<ObjectId, Error> {
        let snapshot = self
            .session
            .get_object(&self.object.id, &OperationContext::all_properties())?;
        // Carry over only what the type of the copy can accept.
        let ty = match options
            .properties
            .first(property_ids::OBJECT_TYPE_ID)
            .and_then(Value::as_str)
        {
            Some(type_id) if type_id != snapshot.object_type_id() => {
                self.session.get_type_definition(type_id)?
            }
            _ => snapshot.object.object_type.clone(),
        };
        let mut properties = Properties::new();

        for (id, values) in snapshot.properties().iter() {
            let copyable = ty.definition(id).map_or(false, |def| {
                matches!(
                    def.updatability,
                    Updatability::ReadWrite | Updatability::OnCreate
                )
            });
            if copyable {
                properties.insert_all(id, values.iter().cloned());
            }
        }
        properties.overlay(&options.properties);

        let content = match snapshot.content_stream()? {
            Some(stream) => {
                let mut stream = stream.buffered()?;
                if stream.file_name.is_none() {
                    stream.file_name = snapshot.content_stream_file_name().map(ToOwned::to_owned);
                }
                if stream.mime_type.is_none() {
                    stream.mime_type = snapshot.content_stream_mime_type().map(ToOwned::to_owned);
                }
                Some(stream)
            }
            None => None,
        };

        self.session.create_document(
            &properties,
            Some(target_folder),
            content,
            options.versioning_state,
            &options.policies,
            &options.add_aces,
            &options.remove_aces,
        )
    }
}
