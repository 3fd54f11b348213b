//! Authentication and authorization: password hashing, session tokens, the
//! request gate and the ownership policy.

pub mod middleware;
pub mod password;
pub mod policy;
pub mod session;
pub mod token;

pub use middleware::{require_auth, AppState, AuthUser};
pub use password::CredentialHasher;
pub use policy::{authorize_mutation, Decision};
pub use token::{SessionClaims, TokenCodec, TokenError};
