//! Read-only user directory projections.
//!
//! Bridges remote user records into the host's user model, stamping each
//! result with the directory source tag and its resolved roles. Lookup
//! failures become `UserNotFound` and listing failures become empty results:
//! a host aggregating many directories must not be broken by one that is
//! down, and callers of a user directory expect "not found", not transport
//! detail.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{DirectoryClient, SearchCriteria, UserRecord};
use crate::config::{DirectoryConfig, SOURCE};
use crate::error::{DirectoryError, DirectoryResult};

use super::authorizer::AuthorizationService;
use super::principal::RoleIdentifier;

/// A directory user as presented to the host: remote record plus source tag
/// and resolved roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryUser {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub active: bool,
    pub source: String,
    pub roles: HashSet<RoleIdentifier>,
}

pub struct UserDirectoryAdapter {
    config: Arc<DirectoryConfig>,
    client: Arc<dyn DirectoryClient>,
    authorizer: Arc<AuthorizationService>,
}

impl UserDirectoryAdapter {
    pub fn new(
        config: Arc<DirectoryConfig>,
        client: Arc<dyn DirectoryClient>,
        authorizer: Arc<AuthorizationService>,
    ) -> Self {
        Self { config, client, authorizer }
    }

    /// Single-user lookup. An unconfigured directory or any remote failure
    /// signals `UserNotFound`.
    pub async fn get_user(&self, username: &str) -> DirectoryResult<DirectoryUser> {
        if !self.config.is_configured() {
            return Err(DirectoryError::user_not_found(username));
        }
        match self.client.get_user(username).await {
            Ok(record) => Ok(self.complete(record).await),
            Err(e) => {
                warn!(username, error = %e, "user lookup failed");
                Err(DirectoryError::user_not_found(username))
            }
        }
    }

    /// Every username the directory knows; empty on any failure.
    pub async fn list_user_ids(&self) -> HashSet<String> {
        if !self.config.is_configured() {
            warn!("username listing on unconfigured directory");
            return HashSet::new();
        }
        match self.client.list_usernames().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "username listing failed");
                HashSet::new()
            }
        }
    }

    /// All users, bounded by the configured maximum.
    pub async fn list_users(&self) -> Vec<DirectoryUser> {
        self.search_users(&SearchCriteria::default()).await
    }

    /// Bounded search; empty on any failure or when the criteria target a
    /// different directory source.
    pub async fn search_users(&self, criteria: &SearchCriteria) -> Vec<DirectoryUser> {
        if !self.config.is_configured() {
            warn!("user search on unconfigured directory");
            return Vec::new();
        }
        if criteria.source.as_deref().is_some_and(|s| s != SOURCE) {
            return Vec::new();
        }
        match self.client.search_users(criteria, self.config.max_search_results).await {
            Ok(records) => {
                let mut out = Vec::with_capacity(records.len());
                for record in records {
                    out.push(self.complete(record).await);
                }
                out
            }
            Err(e) => {
                warn!(error = %e, "user search failed");
                Vec::new()
            }
        }
    }

    async fn complete(&self, record: UserRecord) -> DirectoryUser {
        let roles = self.authorizer.roles_for(&record.username).await;
        DirectoryUser {
            username: record.username,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            active: record.active,
            source: SOURCE.to_string(),
            roles,
        }
    }
}
