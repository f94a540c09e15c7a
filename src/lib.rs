//! Crowd directory connector.
//!
//! Authenticates and authorizes users against a remote Crowd-style directory
//! service while avoiding a round-trip per request: successfully verified
//! credentials are cached as salted Argon2 hashes and re-checked locally
//! within a TTL window, group memberships map to source-tagged role
//! identifiers, and read-only user projections feed the host's user listing.
//!
//! Services receive their collaborators as explicit constructor arguments;
//! there is no ambient or global lookup.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;

pub use cache::{Clock, CredentialCache, SystemClock};
pub use client::{DirectoryClient, RestDirectoryClient, SearchCriteria, UserRecord};
pub use config::{DirectoryConfig, SOURCE};
pub use error::{DirectoryError, DirectoryResult};
pub use identity::{
    AuthenticationService, AuthorizationService, DirectoryUser, Principal, RoleIdentifier,
    UserDirectoryAdapter,
};
