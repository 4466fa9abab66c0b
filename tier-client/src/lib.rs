//! Tier Client - subscription tier resolver
//!
//! Resolves a user's subscription tier against a PostgREST-style backend:
//! profile lookup cascade, lazy profile creation, newest-subscription query,
//! with a diagnostic trace and a generation-guarded lifecycle.

pub mod config;
pub mod error;
pub mod resolver;
pub mod store;
pub mod watch;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use resolver::TierResolver;
pub use store::{MemoryStore, RestStore, TierStore};
pub use watch::TierWatcher;

// Re-export shared types for convenience
pub use shared::{
    ProfileCreate, ProfileRecord, ResolveDiagnostics, SubscriptionRecord, TierSnapshot,
    UserIdentity, FREE_TIER,
};
