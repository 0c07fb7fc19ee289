//! Operation contexts.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::property_ids;

/// Rendition filter that excludes all renditions.
pub const RENDITION_NONE: &str = "cmis:none";
/// Property filter that selects all properties.
pub const FILTER_ALL: &str = "*";

/// Properties every filtered fetch includes.
const REQUIRED_PROPERTIES: &[&str] = &[
    property_ids::OBJECT_ID,
    property_ids::OBJECT_TYPE_ID,
    property_ids::BASE_TYPE_ID,
];

/// Which relationships to include in a fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncludeRelationships {
    #[default]
    None,
    Source,
    Target,
    Both,
}

impl fmt::Display for IncludeRelationships {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Source => "source",
            Self::Target => "target",
            Self::Both => "both",
        };
        f.write_str(s)
    }
}

/// Controls what optional data a fetch populates.
///
/// A context never mutates server state. Proxies remember the context they
/// were fetched with, and use it again on refresh.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    /// Comma-separated list of property query names, or `*`.
    /// `None` means the repository default.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub include_acls: bool,
    #[serde(default = "defaults::yes")]
    pub include_allowable_actions: bool,
    #[serde(default = "defaults::yes")]
    pub include_path_segments: bool,
    #[serde(default)]
    pub include_policies: bool,
    #[serde(default)]
    pub include_relationships: IncludeRelationships,
    #[serde(default = "defaults::rendition_filter")]
    pub rendition_filter: Option<String>,
    /// Whether fetched objects are read from and written to the session cache.
    #[serde(default = "defaults::yes")]
    pub cache_enabled: bool,
    #[serde(default = "defaults::max_items")]
    pub max_items_per_page: usize,
}

mod defaults {
    pub fn yes() -> bool {
        true
    }

    pub fn rendition_filter() -> Option<String> {
        Some(super::RENDITION_NONE.to_owned())
    }

    pub fn max_items() -> usize {
        100
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self {
            filter: None,
            include_acls: false,
            include_allowable_actions: true,
            include_path_segments: true,
            include_policies: false,
            include_relationships: IncludeRelationships::None,
            rendition_filter: defaults::rendition_filter(),
            cache_enabled: true,
            max_items_per_page: defaults::max_items(),
        }
    }
}

impl OperationContext {
    /// A context that requests every property and nothing else.
    pub fn all_properties() -> Self {
        Self {
            filter: Some(FILTER_ALL.to_owned()),
            include_acls: false,
            include_allowable_actions: false,
            include_path_segments: false,
            include_policies: false,
            include_relationships: IncludeRelationships::None,
            rendition_filter: Some(RENDITION_NONE.to_owned()),
            cache_enabled: false,
            max_items_per_page: defaults::max_items(),
        }
    }

    /// Set the property filter. Unless all properties are selected, the
    /// properties needed to identify an object are always added.
    pub fn filter(mut self, filter: impl IntoIterator<Item = impl ToString>) -> Self {
        let mut ids = filter
            .into_iter()
            .map(|s| s.to_string().trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>();

        if ids.is_empty() {
            self.filter = None;
            return self;
        }
        if !ids.contains(FILTER_ALL) {
            ids.extend(REQUIRED_PROPERTIES.iter().map(|p| (*p).to_owned()));
        }
        self.filter = Some(ids.into_iter().collect::<Vec<_>>().join(","));
        self
    }

    pub fn include_acls(mut self, yes: bool) -> Self {
        self.include_acls = yes;
        self
    }

    pub fn include_allowable_actions(mut self, yes: bool) -> Self {
        self.include_allowable_actions = yes;
        self
    }

    pub fn include_path_segments(mut self, yes: bool) -> Self {
        self.include_path_segments = yes;
        self
    }

    pub fn include_policies(mut self, yes: bool) -> Self {
        self.include_policies = yes;
        self
    }

    pub fn include_relationships(mut self, rels: IncludeRelationships) -> Self {
        self.include_relationships = rels;
        self
    }

    pub fn rendition_filter(mut self, filter: Option<impl ToString>) -> Self {
        self.rendition_filter = filter.map(|f| f.to_string());
        self
    }

    pub fn cache_enabled(mut self, yes: bool) -> Self {
        self.cache_enabled = yes;
        self
    }

    /// The property filter, if one was set.
    pub fn filter_str(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// The rendition filter, if one was set.
    pub fn rendition_filter_str(&self) -> Option<&str> {
        self.rendition_filter.as_deref()
    }

    /// Key identifying the shape of the data this context fetches.
    ///
    /// Objects fetched with contexts sharing a key are interchangeable in
    /// the session cache. `cache_enabled` and paging do not affect the key.
    pub fn cache_key(&self) -> String {
        let flag = |b: bool| if b { '1' } else { '0' };
        let rels = match self.include_relationships {
            IncludeRelationships::None => 'N',
            IncludeRelationships::Source => 'S',
            IncludeRelationships::Target => 'T',
            IncludeRelationships::Both => 'B',
        };

        format!(
            "{}{}{}{}{}|{}|{}",
            flag(self.include_acls),
            flag(self.include_allowable_actions),
            flag(self.include_path_segments),
            flag(self.include_policies),
            rels,
            self.filter.as_deref().unwrap_or_default(),
            self.rendition_filter.as_deref().unwrap_or_default(),
        )
    }
}
