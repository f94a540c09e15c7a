//! Group-to-role resolution for authenticated principals.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::DirectoryClient;
use crate::config::{DirectoryConfig, SOURCE};

use super::principal::{Principal, RoleIdentifier};

pub struct AuthorizationService {
    config: Arc<DirectoryConfig>,
    client: Arc<dyn DirectoryClient>,
}

impl AuthorizationService {
    pub fn new(config: Arc<DirectoryConfig>, client: Arc<dyn DirectoryClient>) -> Self {
        Self { config, client }
    }

    /// Resolve `username`'s nested group memberships into source-tagged roles.
    ///
    /// Degrades to an empty role set when the directory is unconfigured or the
    /// lookup fails: a principal with zero roles is a safe state for
    /// authorization, and an already-authenticated request should not be
    /// broken by a directory hiccup.
    pub async fn roles_for(&self, username: &str) -> HashSet<RoleIdentifier> {
        if !self.config.is_configured() {
            warn!(username, "role lookup on unconfigured directory");
            return HashSet::new();
        }
        match self.client.nested_groups(username).await {
            Ok(groups) => {
                debug!(username, count = groups.len(), "resolved group memberships");
                groups.into_iter().map(|g| RoleIdentifier::new(SOURCE, g)).collect()
            }
            Err(e) => {
                warn!(username, error = %e, "group lookup failed, granting no roles");
                HashSet::new()
            }
        }
    }

    /// Roles for a principal, honoring its claimed source: a principal vouched
    /// for by a different directory gets nothing from this one, so roles never
    /// leak across directories.
    pub async fn roles_for_principal(&self, principal: &Principal) -> HashSet<RoleIdentifier> {
        if principal.source != SOURCE {
            return HashSet::new();
        }
        self.roles_for(&principal.username).await
    }
}
