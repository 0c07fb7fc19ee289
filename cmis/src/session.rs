//! Repository sessions.
//!
//! A [`Session`] owns every cached object snapshot, keyed by object id.
//! Proxies ([`Document`]) borrow the session and hold only a shared
//! snapshot, so evicting an entry never invalidates a proxy a caller holds:
//! the proxy simply keeps its last-known state.
#![allow(clippy::too_many_arguments)]
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::acl::Ace;
use crate::binding;
use crate::binding::{
    BindingType, CreateDocument, CreateDocumentFromSource, Feature, Fetch, ObjectData,
    RepositoryBinding, RepositoryInfo,
};
use crate::cache::{Get, InMemory, NoCache, ObjectCache, Remove, Update};
use crate::config::Config;
use crate::content::ContentStream;
use crate::context::OperationContext;
use crate::document::Document;
use crate::error::Error;
use crate::factory::{ConversionError, ObjectFactory};
use crate::object::{property_ids, Object, ObjectId, VersioningState};
use crate::property::{Properties, TypeDefinition, Updatability, Value};

/// Updatability modes accepted when creating an object.
const ON_CREATE: &[Updatability] = &[Updatability::ReadWrite, Updatability::OnCreate];

/// A connection to a single repository.
pub struct Session<C = InMemory<Object>> {
    binding: Arc<dyn RepositoryBinding>,
    info: RepositoryInfo,
    factory: ObjectFactory,
    default_context: OperationContext,
    /// Session-wide cache switch. Overrides any context.
    caching: bool,
    cache: RwLock<C>,
    types: RwLock<HashMap<String, Arc<TypeDefinition>>>,
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("repository", &self.info.id)
            .field("binding", &self.binding.binding_type())
            .finish()
    }
}

impl Session<InMemory<Object>> {
    /// Open a session with an in-memory object cache.
    pub fn open(binding: Arc<dyn RepositoryBinding>, config: &Config) -> Result<Self, Error> {
        Self::with_cache(binding, config, InMemory::default())
    }
}

impl Session<NoCache> {
    /// Open a session that never caches objects.
    pub fn uncached(binding: Arc<dyn RepositoryBinding>, config: &Config) -> Result<Self, Error> {
        Self::with_cache(binding, config, NoCache)
    }
}

impl<C: ObjectCache> Session<C> {
    /// Open a session using the given cache.
    pub fn with_cache(
        binding: Arc<dyn RepositoryBinding>,
        config: &Config,
        cache: C,
    ) -> Result<Self, Error> {
        let repositories = binding.repository_service();
        let info = match &config.repository_id {
            Some(id) => repositories.get_repository_info(id)?,
            None => repositories
                .get_repository_infos()?
                .into_iter()
                .next()
                .ok_or_else(|| binding::Error::ObjectNotFound("no repositories".to_owned()))?,
        };
        log::debug!(
            target: "cmis",
            "Opened repository `{}` (CMIS {}) over {:?}",
            info.id,
            info.cmis_version,
            binding.binding_type()
        );

        Ok(Self {
            binding,
            info,
            factory: ObjectFactory,
            default_context: config.default_context(),
            caching: config.cache.enabled,
            cache: RwLock::new(cache),
            types: RwLock::new(HashMap::new()),
        })
    }

    pub fn repository_id(&self) -> &str {
        &self.info.id
    }

    pub fn repository_info(&self) -> &RepositoryInfo {
        &self.info
    }

    pub fn binding(&self) -> &dyn RepositoryBinding {
        self.binding.as_ref()
    }

    pub fn factory(&self) -> &ObjectFactory {
        &self.factory
    }

    /// Context used when the caller does not supply one.
    pub fn default_context(&self) -> &OperationContext {
        &self.default_context
    }

    /// Whether objects fetched with `context` are read from and written to
    /// the cache.
    fn caches(&self, context: &OperationContext) -> bool {
        self.caching && context.cache_enabled
    }

    /// Whether both the binding and the repository support `feature`.
    pub fn supports(&self, feature: Feature) -> bool {
        self.binding.supports(feature) && self.info.supports(feature)
    }

    /// Fail with [`Error::NotSupported`] unless `feature` is supported.
    pub fn ensure(&self, feature: Feature) -> Result<(), Error> {
        if self.supports(feature) {
            return Ok(());
        }
        Err(Error::NotSupported {
            feature,
            repository: self.info.id.clone(),
        })
    }

    pub fn create_object_id(&self, id: impl Into<String>) -> Result<ObjectId, Error> {
        ObjectId::try_from(id.into()).map_err(Error::from)
    }

    /// Get a type definition, fetching it on first use.
    pub fn get_type_definition(&self, type_id: &str) -> Result<Arc<TypeDefinition>, Error> {
        if let Some(ty) = self.types_read().get(type_id) {
            return Ok(ty.clone());
        }
        let ty = Arc::new(
            self.binding
                .repository_service()
                .get_type_definition(self.repository_id(), type_id)?,
        );
        self.types
            .write()
            .expect("Session::get_type_definition: type lock is not poisoned")
            .insert(type_id.to_owned(), ty.clone());

        Ok(ty)
    }

    /// Get a document, from the cache if the context allows it.
    pub fn get_object(
        &self,
        id: &ObjectId,
        context: &OperationContext,
    ) -> Result<Document<'_, C>, Error> {
        if self.caches(context) {
            if let Some(object) = self.cache_read().get(id, &context.cache_key()) {
                log::trace!(target: "cmis", "Cache hit for `{id}`");
                return Document::new(self, object);
            }
        }
        let object = self.load(id, Arc::new(context.clone()))?;

        Document::new(self, object)
    }

    /// Fetch an object from the repository, bypassing the cache for reads.
    /// The result is cached if the context allows it.
    pub(crate) fn load(
        &self,
        id: &ObjectId,
        context: Arc<OperationContext>,
    ) -> Result<Arc<Object>, Error> {
        log::trace!(target: "cmis", "Fetching `{id}`");

        let data = self.binding.object_service().get_object(
            self.repository_id(),
            id,
            Fetch::from(context.as_ref()),
        )?;
        self.cached(self.convert_object(data, context)?)
    }

    /// Get the latest version, or latest major version, in the version series
    /// of `id`.
    pub fn get_latest_document_version(
        &self,
        id: &ObjectId,
        major: bool,
        context: &OperationContext,
    ) -> Result<Document<'_, C>, Error> {
        let version_series_id = self
            .cache_read()
            .get(id, &context.cache_key())
            .and_then(|o| {
                o.properties
                    .first(property_ids::VERSION_SERIES_ID)
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned)
            });
        self.latest_version(id, version_series_id, major, context)
    }

    pub(crate) fn latest_version(
        &self,
        id: &ObjectId,
        mut version_series_id: Option<String>,
        major: bool,
        context: &OperationContext,
    ) -> Result<Document<'_, C>, Error> {
        // Only the web services binding needs the series id to resolve the
        // latest version.
        if version_series_id.is_none() && self.binding.binding_type() == BindingType::WebServices {
            let doc = self.get_object(id, context)?;
            version_series_id = doc.version_series_id().map(ToOwned::to_owned);
        }
        let context = Arc::new(context.clone());
        let data = self.binding.versioning_service().get_object_of_latest_version(
            self.repository_id(),
            id,
            version_series_id.as_deref(),
            major,
            Fetch::from(context.as_ref()),
        )?;
        let object = self.cached(self.convert_object(data, context)?)?;

        Document::new(self, object)
    }

    /// Create a document, returning its id.
    pub fn create_document(
        &self,
        properties: &Properties,
        folder_id: Option<&ObjectId>,
        content_stream: Option<ContentStream>,
        versioning_state: Option<VersioningState>,
        policies: &[ObjectId],
        add_aces: &[Ace],
        remove_aces: &[Ace],
    ) -> Result<ObjectId, Error> {
        let type_id = properties
            .first(property_ids::OBJECT_TYPE_ID)
            .and_then(Value::as_str)
            .ok_or(ConversionError::MissingObjectType)?;
        let ty = self.get_type_definition(type_id)?;
        let create = CreateDocument {
            properties: self.factory.convert_properties(properties, &ty, ON_CREATE)?,
            folder_id: folder_id.map(ToString::to_string),
            content_stream: content_stream.map(|s| self.factory.convert_content_stream(s)),
            versioning_state,
            policies: self.factory.convert_policies(policies),
            add_aces: self.factory.convert_aces(add_aces),
            remove_aces: self.factory.convert_aces(remove_aces),
        };
        let id = self
            .binding
            .object_service()
            .create_document(self.repository_id(), create)?;

        self.create_object_id(id)
    }

    /// Copy `source` on the server, returning the id of the copy.
    ///
    /// Fails with [`Error::NotSupported`], without contacting the server, if
    /// the binding or repository cannot copy documents.
    pub fn create_document_from_source(
        &self,
        source: &Document<'_, C>,
        properties: &Properties,
        folder_id: Option<&ObjectId>,
        versioning_state: Option<VersioningState>,
        policies: &[ObjectId],
        add_aces: &[Ace],
        remove_aces: &[Ace],
    ) -> Result<ObjectId, Error> {
        self.ensure(Feature::CreateDocumentFromSource)?;

        let ty = match properties
            .first(property_ids::OBJECT_TYPE_ID)
            .and_then(Value::as_str)
        {
            Some(type_id) => self.get_type_definition(type_id)?,
            None => source.object().object_type.clone(),
        };
        let create = CreateDocumentFromSource {
            source_id: source.id().to_string(),
            properties: self.factory.convert_properties(properties, &ty, ON_CREATE)?,
            folder_id: folder_id.map(ToString::to_string),
            versioning_state,
            policies: self.factory.convert_policies(policies),
            add_aces: self.factory.convert_aces(add_aces),
            remove_aces: self.factory.convert_aces(remove_aces),
        };
        let id = self
            .binding
            .object_service()
            .create_document_from_source(self.repository_id(), create)?;

        self.create_object_id(id)
    }

    /// Get the content of `id`, or of one of its renditions.
    ///
    /// Returns `None` if the object has no content.
    pub fn get_content_stream(
        &self,
        id: &ObjectId,
        stream_id: Option<&str>,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<Option<ContentStream>, Error> {
        match self.binding.object_service().get_content_stream(
            self.repository_id(),
            id,
            stream_id,
            offset,
            length,
        ) {
            Ok(stream) => Ok(Some(stream)),
            Err(binding::Error::Constraint(reason)) => {
                log::trace!(target: "cmis", "No content for `{id}`: {reason}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object, or its whole version series, and evict it.
    pub fn delete(&self, id: &ObjectId, all_versions: bool) -> Result<(), Error> {
        self.binding
            .object_service()
            .delete_object(self.repository_id(), id, all_versions)?;
        self.remove_object_from_cache(id)
    }

    /// Evict every cached snapshot of `id`.
    pub fn remove_object_from_cache(&self, id: &ObjectId) -> Result<(), Error> {
        self.cache_write()
            .remove(id)
            .map_err(|e| Error::CacheRemove {
                id: id.clone(),
                err: e.into(),
            })?;
        log::debug!(target: "cmis", "Evicted `{id}` from the object cache");

        Ok(())
    }

    /// Whether any snapshot of `id` is cached.
    pub fn is_cached(&self, id: &ObjectId) -> bool {
        self.cache_read().contains(id)
    }

    /// Get the cached snapshot of `id` fetched with `context`, if any.
    pub fn cached_object(&self, id: &ObjectId, context: &OperationContext) -> Option<Arc<Object>> {
        self.cache_read().get(id, &context.cache_key())
    }

    /// Evict everything from the object cache.
    pub fn clear(&self) -> Result<(), Error> {
        self.cache_write()
            .remove_all()
            .map_err(|e| Error::CacheClear { err: e.into() })?;
        log::debug!(target: "cmis", "Cleared the object cache");

        Ok(())
    }

    /// Convert wire data to an object, resolving its type.
    pub(crate) fn convert_object(
        &self,
        data: ObjectData,
        context: Arc<OperationContext>,
    ) -> Result<Object, Error> {
        let type_id = data.type_id().ok_or_else(|| {
            ConversionError::MissingTypeId(data.id().unwrap_or("<unknown>").to_owned())
        })?;
        let ty = self.get_type_definition(type_id)?;

        self.factory
            .convert_object(data, ty, context)
            .map_err(Error::from)
    }

    /// Put a freshly fetched object in the cache, if its context allows it.
    pub(crate) fn cached(&self, object: Object) -> Result<Arc<Object>, Error> {
        let object = Arc::new(object);
        if self.caches(&object.context) {
            self.cache_write()
                .update(&object.id, &object.context.cache_key(), object.clone())
                .map_err(|e| Error::CacheUpdate {
                    id: object.id.clone(),
                    err: e.into(),
                })?;
        }
        Ok(object)
    }

    fn cache_read(&self) -> RwLockReadGuard<'_, C> {
        self.cache
            .read()
            .expect("Session::cache_read: cache lock is not poisoned")
    }

    fn cache_write(&self) -> RwLockWriteGuard<'_, C> {
        self.cache
            .write()
            .expect("Session::cache_write: cache lock is not poisoned")
    }

    fn types_read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TypeDefinition>>> {
        self.types
            .read()
            .expect("Session::types_read: type lock is not poisoned")
    }
}
