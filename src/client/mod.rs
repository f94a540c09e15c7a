//! Remote directory client abstraction.
//!
//! [`DirectoryClient`] is the single seam between the connector and the remote
//! directory's REST API: the authentication, authorization and user-directory
//! services all dispatch through it, so no URL construction or response
//! parsing leaks outside [`rest`]. Implementations are stateless adapters —
//! no caching, no retries beyond what the transport provides.

pub mod rest;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DirectoryResult;

pub use rest::RestDirectoryClient;

/// A user as the remote directory reports it, before the connector stamps
/// source and roles onto it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Search filter for [`DirectoryClient::search_users`]. Empty pattern or role
/// fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    /// Substring/prefix match against the username.
    pub user_id: Option<String>,
    /// Substring/prefix match against the email address.
    pub email: Option<String>,
    /// Restrict results to members of at least one of these groups.
    pub roles: HashSet<String>,
    /// Directory source the caller is searching; `None` means this one.
    pub source: Option<String>,
}

#[async_trait::async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Verify a username/password pair against the remote directory.
    /// `Ok(())` means the directory vouched for the credential;
    /// `InvalidCredentials` and `Unavailable` are kept distinct so the caller
    /// can tell a bad password from an outage.
    async fn authenticate(&self, username: &str, password: &str) -> DirectoryResult<()>;

    /// Transitive (nested) group membership for `username`. Transport errors
    /// surface to the caller; the authorizer decides the fallback.
    async fn nested_groups(&self, username: &str) -> DirectoryResult<HashSet<String>>;

    /// Single-user lookup.
    async fn get_user(&self, username: &str) -> DirectoryResult<UserRecord>;

    /// Bounded user search. An empty criteria set matches all users up to
    /// `max_results`.
    async fn search_users(
        &self,
        criteria: &SearchCriteria,
        max_results: usize,
    ) -> DirectoryResult<Vec<UserRecord>>;

    /// Every username the directory knows.
    async fn list_usernames(&self) -> DirectoryResult<HashSet<String>>;
}
