//! Tier resolution
//!
//! Two-phase read: ensure the user's profile row exists (4-stage fallback
//! cascade, short-circuiting at the first success), then fetch the newest
//! subscription row for the identity. All failures funnel into the
//! diagnostics payload; the caller always gets a snapshot back.

use std::sync::Arc;

use shared::{
    ProfileCreate, ProfileStage, ResolveDiagnostics, TierSnapshot, UserIdentity, FREE_TIER,
};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::TierStore;

/// Subscription tier resolver over a backing store
#[derive(Clone)]
pub struct TierResolver {
    store: Arc<dyn TierStore>,
}

impl TierResolver {
    pub fn new(store: Arc<dyn TierStore>) -> Self {
        Self { store }
    }

    /// Resolve the tier for an identity. Never fails: errors are logged and
    /// recorded in the snapshot's diagnostics, and the tier stays `"free"`.
    pub async fn resolve(&self, identity: &UserIdentity) -> TierSnapshot {
        let mut diagnostics = ResolveDiagnostics::default();

        let profile_key = match self.ensure_profile(identity, &mut diagnostics).await {
            Ok(key) => key,
            Err(err) => {
                warn!(email = %identity.email, error = %err, "profile resolution failed");
                diagnostics.profile_error = Some(err.to_string());
                return TierSnapshot {
                    tier: FREE_TIER.to_string(),
                    loading: false,
                    diagnostics,
                };
            }
        };
        debug!(email = %identity.email, profile_key = %profile_key, "profile resolved");

        let tier = match self.store.latest_subscription(&identity.id).await {
            Ok(Some(row)) => row.tier,
            Ok(None) => FREE_TIER.to_string(),
            Err(err) => {
                warn!(user_id = %identity.id, error = %err, "subscription query failed");
                diagnostics.subscription_error = Some(err.to_string());
                return TierSnapshot {
                    tier: FREE_TIER.to_string(),
                    loading: false,
                    diagnostics,
                };
            }
        };

        diagnostics.final_tier = Some(tier.clone());
        TierSnapshot {
            tier,
            loading: false,
            diagnostics,
        }
    }

    /// Make sure a profile row exists for the identity, returning its key.
    ///
    /// Stages, first success wins:
    /// 1. exact email match
    /// 2. case-insensitive match, accepted only when unambiguous
    /// 3. server-side auth lookup by URL-encoded email
    /// 4. idempotent creation (fatal on failure, e.g. RLS rejection)
    pub async fn ensure_profile(
        &self,
        identity: &UserIdentity,
        diagnostics: &mut ResolveDiagnostics,
    ) -> StoreResult<String> {
        match self.store.find_profile_exact(&identity.email).await? {
            Some(profile) => {
                diagnostics.record_stage(ProfileStage::Exact, "hit");
                return Ok(profile.id);
            }
            None => diagnostics.record_stage(ProfileStage::Exact, "miss"),
        }

        let mut matches = self.store.find_profiles_ci(&identity.email).await?;
        match matches.len() {
            1 => {
                diagnostics.record_stage(ProfileStage::CaseInsensitive, "hit");
                return Ok(matches.remove(0).id);
            }
            0 => diagnostics.record_stage(ProfileStage::CaseInsensitive, "miss"),
            n => {
                // Ambiguity is treated as a miss, not an error, but the
                // count stays visible in the trace.
                diagnostics.record_stage(ProfileStage::CaseInsensitive, format!("ambiguous ({})", n))
            }
        }

        let encoded = urlencoding::encode(&identity.email);
        match self.store.lookup_auth_user_by_email(&encoded).await? {
            Some(id) => {
                diagnostics.record_stage(ProfileStage::Rpc, "hit");
                return Ok(id);
            }
            None => diagnostics.record_stage(ProfileStage::Rpc, "miss"),
        }

        let create = ProfileCreate::new(&identity.email, &identity.id);
        let created = self.store.upsert_profile(&create).await?;
        diagnostics.record_stage(ProfileStage::Create, "created");
        Ok(created.id)
    }
}
