//! Authentication, authorization and user-directory services built on the
//! remote client and the credential cache. Keep the public surface thin and
//! split implementation across sub-modules.

mod authenticator;
mod authorizer;
mod principal;
mod users;

pub use authenticator::AuthenticationService;
pub use authorizer::AuthorizationService;
pub use principal::{Principal, RoleIdentifier};
pub use users::{DirectoryUser, UserDirectoryAdapter};
