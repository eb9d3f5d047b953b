//! Node — a single domain controller in the forest.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A directory-service node, identified by its fully-qualified host name
/// and owning domain. Node names are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub domain: String,
}

impl Node {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }

    /// Case-insensitive ordering key used everywhere nodes are sorted.
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
