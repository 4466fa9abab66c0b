//! Profile Model

use serde::{Deserialize, Serialize};

/// Profile entity (row in the `profiles` table)
///
/// Links an authentication identity to application data. May not exist yet
/// for a freshly signed-up user; the resolver creates it lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub email: String,
    pub auth_id: String,
}

/// Create profile payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCreate {
    pub email: String,
    pub auth_id: String,
}

impl ProfileCreate {
    pub fn new(email: impl Into<String>, auth_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            auth_id: auth_id.into(),
        }
    }
}
