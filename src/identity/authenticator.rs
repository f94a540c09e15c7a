//! Cache-first credential verification.
//!
//! The cache exists purely to avoid a remote round-trip for the high-frequency
//! "verify this password again" pattern (per-request basic auth). It is never
//! the source of truth for a new or changed credential: a local miss or
//! mismatch always falls through to the remote directory, so an upstream
//! password change takes effect immediately.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::CredentialCache;
use crate::client::DirectoryClient;
use crate::config::{DirectoryConfig, SOURCE};
use crate::error::{DirectoryError, DirectoryResult};

use super::principal::Principal;

pub struct AuthenticationService {
    config: Arc<DirectoryConfig>,
    client: Arc<dyn DirectoryClient>,
    cache: Arc<CredentialCache>,
}

impl AuthenticationService {
    pub fn new(
        config: Arc<DirectoryConfig>,
        client: Arc<dyn DirectoryClient>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self { config, client, cache }
    }

    /// Verify `username`/`password`, consulting the credential cache before
    /// the remote directory.
    ///
    /// Outcomes:
    /// - cache hit → `Ok`, no remote call;
    /// - remote accepts → cache repopulated, `Ok`;
    /// - remote rejects → stale cache entry dropped, `InvalidCredentials`;
    /// - remote unreachable → `Unavailable` (or, under the fail-open policy,
    ///   `Ok` if an entry for this exact credential is still cached).
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> DirectoryResult<Principal> {
        if !self.config.is_configured() {
            return Err(DirectoryError::NotConfigured);
        }

        if self.cache.verify(username, password) {
            debug!(username, "authenticated from credential cache");
            return Ok(Principal::new(username, SOURCE));
        }

        match self.client.authenticate(username, password).await {
            Ok(()) => {
                self.cache.store(username, password);
                info!(username, "authenticated against remote directory");
                Ok(Principal::new(username, SOURCE))
            }
            Err(e) if e.is_invalid_credentials() => {
                // The password may have changed upstream while an entry for
                // the old one was still cached; drop it so the stale
                // credential stops validating locally.
                self.cache.invalidate(username);
                debug!(username, "remote directory rejected credentials");
                Err(e)
            }
            Err(e) if e.is_unavailable() => {
                if self.config.fail_open && self.cache.verify_ignore_ttl(username, password) {
                    warn!(
                        username,
                        "directory unreachable, accepting cached credential (fail-open)"
                    );
                    return Ok(Principal::new(username, SOURCE));
                }
                warn!(username, error = %e, "directory unreachable during authentication");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
