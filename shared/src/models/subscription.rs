//! Subscription Model

use serde::{Deserialize, Serialize};

/// Subscription entity (row in the `subscriptions` table)
///
/// Several rows may exist for one user; the newest `created_at` wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub tier: String,
    /// Creation time (Unix millis)
    pub created_at: i64,
    /// Owning auth identity id
    pub user_id: String,
}

impl SubscriptionRecord {
    pub fn new(tier: impl Into<String>, created_at: i64, user_id: impl Into<String>) -> Self {
        Self {
            tier: tier.into(),
            created_at,
            user_id: user_id.into(),
        }
    }
}
