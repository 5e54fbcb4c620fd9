//! Resources
//!
//! A resource is the object an action targets. It carries no permission
//! data; it only scopes action-gate rules.

use serde::{Deserialize, Serialize};

/// A named scoping token for action-gate rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Resource {
    name: String,
}

impl Resource {
    /// Create a resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Get the resource name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
