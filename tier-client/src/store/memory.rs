//! In-memory store
//!
//! In-process `TierStore` used by tests and local development. Zero network
//! overhead; rows live behind mutexes, and a handful of knobs simulate the
//! failure modes the REST backend can produce (RLS rejection, query errors,
//! slow responses).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use shared::{ProfileCreate, ProfileRecord, SubscriptionRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::TierStore;

/// In-memory backing store
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Mutex<Vec<ProfileRecord>>,
    subscriptions: Mutex<Vec<SubscriptionRecord>>,
    /// URL-encoded email -> auth id, as the RPC would resolve it
    auth_users: Mutex<HashMap<String, String>>,
    next_id: AtomicU64,
    calls: AtomicU64,
    deny_upsert: AtomicBool,
    fail_subscriptions: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile row
    pub fn add_profile(&self, id: impl Into<String>, email: impl Into<String>, auth_id: impl Into<String>) {
        self.profiles.lock().unwrap().push(ProfileRecord {
            id: id.into(),
            email: email.into(),
            auth_id: auth_id.into(),
        });
    }

    /// Seed a subscription row
    pub fn add_subscription(&self, tier: impl Into<String>, created_at: i64, user_id: impl Into<String>) {
        self.subscriptions
            .lock()
            .unwrap()
            .push(SubscriptionRecord::new(tier, created_at, user_id));
    }

    /// Register an auth user as the server-side RPC would know it
    pub fn add_auth_user(&self, email: &str, auth_id: impl Into<String>) {
        self.auth_users
            .lock()
            .unwrap()
            .insert(urlencoding::encode(email).into_owned(), auth_id.into());
    }

    /// Reject profile upserts, as an RLS policy would
    pub fn deny_upserts(&self) {
        self.deny_upsert.store(true, Ordering::SeqCst);
    }

    /// Fail subscription queries with an internal error
    pub fn fail_subscription_queries(&self) {
        self.fail_subscriptions.store(true, Ordering::SeqCst);
    }

    /// Delay every store call (for staleness tests)
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Number of store calls made so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    async fn track_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TierStore for MemoryStore {
    async fn find_profile_exact(&self, email: &str) -> StoreResult<Option<ProfileRecord>> {
        self.track_call().await;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.email == email).cloned())
    }

    async fn find_profiles_ci(&self, email: &str) -> StoreResult<Vec<ProfileRecord>> {
        self.track_call().await;
        let needle = email.to_lowercase();
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles
            .iter()
            .filter(|p| p.email.to_lowercase() == needle)
            .cloned()
            .collect())
    }

    async fn lookup_auth_user_by_email(&self, encoded_email: &str) -> StoreResult<Option<String>> {
        self.track_call().await;
        Ok(self.auth_users.lock().unwrap().get(encoded_email).cloned())
    }

    async fn upsert_profile(&self, profile: &ProfileCreate) -> StoreResult<ProfileRecord> {
        self.track_call().await;
        if self.deny_upsert.load(Ordering::SeqCst) {
            return Err(StoreError::Forbidden(
                "new row violates row-level security policy for table \"profiles\"".into(),
            ));
        }

        let mut profiles = self.profiles.lock().unwrap();
        if let Some(existing) = profiles.iter_mut().find(|p| p.email == profile.email) {
            // merge-duplicates: keep the row, refresh the auth binding
            existing.auth_id = profile.auth_id.clone();
            return Ok(existing.clone());
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = ProfileRecord {
            id: format!("profile-{}", n),
            email: profile.email.clone(),
            auth_id: profile.auth_id.clone(),
        };
        profiles.push(row.clone());
        Ok(row)
    }

    async fn latest_subscription(&self, auth_id: &str) -> StoreResult<Option<SubscriptionRecord>> {
        self.track_call().await;
        if self.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("subscription query failed".into()));
        }
        let subscriptions = self.subscriptions.lock().unwrap();
        Ok(subscriptions
            .iter()
            .filter(|s| s.user_id == auth_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }
}
