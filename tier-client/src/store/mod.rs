//! Backing store seam
//!
//! The resolver only sees the `TierStore` trait; `RestStore` speaks the
//! PostgREST API over the network, `MemoryStore` is an in-process variant
//! for tests and local development.

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use shared::{ProfileCreate, ProfileRecord, SubscriptionRecord};

use crate::error::StoreResult;

/// Backing store trait
#[async_trait]
pub trait TierStore: Send + Sync {
    /// Case-sensitive email match against `profiles`; single row expected.
    async fn find_profile_exact(&self, email: &str) -> StoreResult<Option<ProfileRecord>>;

    /// Case-insensitive email match; returns every row that matches so the
    /// caller can reject ambiguous results.
    async fn find_profiles_ci(&self, email: &str) -> StoreResult<Vec<ProfileRecord>>;

    /// Server-side `get_auth_user_by_email` lookup, keyed by URL-encoded
    /// email. Returns the auth identifier, or None when the user is unknown.
    async fn lookup_auth_user_by_email(&self, encoded_email: &str) -> StoreResult<Option<String>>;

    /// Idempotent profile creation (upsert on email). Returns the row.
    async fn upsert_profile(&self, profile: &ProfileCreate) -> StoreResult<ProfileRecord>;

    /// Newest subscription row for the owning auth identity, if any.
    async fn latest_subscription(&self, auth_id: &str) -> StoreResult<Option<SubscriptionRecord>>;
}
