//! Ownership rule for mutating posts.

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Only the owner may update or delete a resource.
///
/// An empty owner id never matches, so a record with a missing owner is
/// immutable rather than writable by anyone.
pub fn authorize_mutation(owner_id: &str, principal_id: &str) -> Decision {
    if !owner_id.is_empty() && owner_id == principal_id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
