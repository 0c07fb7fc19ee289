use std::io;

use thiserror::Error;

use crate::binding;
use crate::binding::Feature;
use crate::factory::ConversionError;
use crate::object::{BaseType, ObjectId, ParseObjectId};

/// Session and document error.
#[derive(Debug, Error)]
pub enum Error {
    /// The repository or binding lacks a capability. Raised before any
    /// remote call is made.
    #[error("{feature} is not supported by repository `{repository}`")]
    NotSupported {
        feature: Feature,
        repository: String,
    },
    /// Failure reported by the remote repository, relayed unchanged.
    #[error(transparent)]
    Binding(#[from] binding::Error),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("invalid object id: {0}")]
    ObjectId(#[from] ParseObjectId),
    #[error("object `{id}` is a {base}, expected a document")]
    NotADocument { id: ObjectId, base: BaseType },
    #[error("content stream: {0}")]
    Io(#[from] io::Error),
    #[error("failed to update cache entry for `{id}`: {err}")]
    CacheUpdate {
        id: ObjectId,
        #[source]
        err: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("failed to remove cache entry for `{id}`: {err}")]
    CacheRemove {
        id: ObjectId,
        #[source]
        err: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("failed to clear the object cache: {err}")]
    CacheClear {
        #[source]
        err: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    /// Whether the operation failed because the repository does not support
    /// it, whether detected locally or reported by the server.
    pub fn is_not_supported(&self) -> bool {
        matches!(
            self,
            Self::NotSupported { .. } | Self::Binding(binding::Error::NotSupported(_))
        )
    }
}
