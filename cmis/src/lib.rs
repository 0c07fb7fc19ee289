#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::large_enum_variant)]
#![cfg_attr(not(test), warn(clippy::unwrap_used))]

pub mod acl;
pub mod binding;
pub mod cache;
pub mod config;
pub mod content;
pub mod context;
pub mod document;
pub mod error;
pub mod factory;
#[cfg(feature = "logger")]
pub mod logger;
pub mod object;
pub mod property;
pub mod session;

pub use config::Config;
pub use document::Document;
pub use error::Error;
pub use session::Session;

pub mod prelude {
    use super::*;

    pub use acl::{Ace, Acl};
    pub use binding::RepositoryBinding;
    pub use content::ContentStream;
    pub use context::{IncludeRelationships, OperationContext};
    pub use document::{CopyOptions, Resolve};
    pub use object::{BaseType, ObjectId, VersioningState};
    pub use property::{Properties, Updatability, Value};
    pub use session::Session;
}
