//! Domain models

pub mod identity;
pub mod profile;
pub mod subscription;

pub use identity::UserIdentity;
pub use profile::{ProfileCreate, ProfileRecord};
pub use subscription::SubscriptionRecord;
