use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A (source, name) pair representing a group/permission grant from one
/// specific directory. Equality is by both fields so identically named roles
/// from different directories never collide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RoleIdentifier {
    pub source: String,
    pub name: String,
}

impl RoleIdentifier {
    pub fn new<S: Into<String>, N: Into<String>>(source: S, name: N) -> Self {
        Self { source: source.into(), name: name.into() }
    }
}

/// An authenticated identity plus its resolved role set, built per request
/// and never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    /// Which directory vouched for this identity.
    pub source: String,
    #[serde(default)]
    pub roles: HashSet<RoleIdentifier>,
}

impl Principal {
    pub fn new<U: Into<String>, S: Into<String>>(username: U, source: S) -> Self {
        Self { username: username.into(), source: source.into(), roles: HashSet::new() }
    }
}
