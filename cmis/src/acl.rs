use serde::{Deserialize, Serialize};

/// An access control entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ace {
    pub principal: String,
    pub permissions: Vec<String>,
    /// Whether the entry is directly applied to the object, as opposed to
    /// being inherited.
    #[serde(default = "direct")]
    pub direct: bool,
}

fn direct() -> bool {
    true
}

impl Ace {
    pub fn new(principal: impl ToString, permissions: impl IntoIterator<Item = impl ToString>) -> Self {
        Self {
            principal: principal.to_string(),
            permissions: permissions.into_iter().map(|p| p.to_string()).collect(),
            direct: true,
        }
    }
}

/// An access control list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acl {
    pub aces: Vec<Ace>,
    /// Whether the list is known to describe the object's permissions exactly.
    #[serde(default)]
    pub exact: bool,
}

impl Acl {
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }
}
