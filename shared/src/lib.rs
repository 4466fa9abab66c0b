//! Shared types for the tier resolver
//!
//! Common types used by the client crate and test backends: user identity,
//! profile and subscription records, and the resolution snapshot.

pub mod models;
pub mod resolve;
pub mod util;

// Re-exports
pub use models::{ProfileCreate, ProfileRecord, SubscriptionRecord, UserIdentity};
pub use resolve::{ProfileStage, ResolveDiagnostics, TierSnapshot, FREE_TIER};
