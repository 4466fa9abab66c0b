//! User identity

use serde::{Deserialize, Serialize};

/// Authenticated user identity, supplied by the host application.
///
/// Opaque to the resolver: `id` is the auth provider's user id, `email` is
/// the address the profile lookup cascade matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}
