//! Resolution result types
//!
//! `TierSnapshot` is what the resolver publishes to the host application;
//! `ResolveDiagnostics` carries the ordered trace of which profile lookup
//! stage ran and how it ended, plus any error payloads.

use serde::{Deserialize, Serialize};

/// Fallback tier used whenever no subscription row exists (or nothing could
/// be resolved at all). Every other tier value is owned by the backend.
pub const FREE_TIER: &str = "free";

/// Profile lookup cascade stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStage {
    /// Case-sensitive email match
    Exact,
    /// Case-insensitive email match (single hit only)
    CaseInsensitive,
    /// Server-side `get_auth_user_by_email` lookup
    Rpc,
    /// Lazy profile creation (upsert)
    Create,
}

impl ProfileStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStage::Exact => "exact",
            ProfileStage::CaseInsensitive => "case_insensitive",
            ProfileStage::Rpc => "rpc",
            ProfileStage::Create => "create",
        }
    }
}

/// Diagnostic trace for one resolution attempt.
///
/// The stage list is append-only while a resolution runs; a new attempt
/// starts from an empty trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveDiagnostics {
    /// Ordered labels, one per cascade stage that ran ("exact: hit", ...)
    pub profile_lookup_stages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_error: Option<String>,
}

impl ResolveDiagnostics {
    /// Append a stage label with its outcome ("hit", "miss", "ambiguous (3)").
    pub fn record_stage(&mut self, stage: ProfileStage, outcome: impl AsRef<str>) {
        self.profile_lookup_stages
            .push(format!("{}: {}", stage.as_str(), outcome.as_ref()));
    }
}

/// One resolution result as seen by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub tier: String,
    pub loading: bool,
    pub diagnostics: ResolveDiagnostics,
}

impl TierSnapshot {
    /// Initial state before any identity was observed.
    pub fn loading() -> Self {
        Self {
            tier: FREE_TIER.to_string(),
            loading: true,
            diagnostics: ResolveDiagnostics::default(),
        }
    }

    /// Non-loading snapshot for an absent identity: free tier, empty trace.
    pub fn signed_out() -> Self {
        Self {
            tier: FREE_TIER.to_string(),
            loading: false,
            diagnostics: ResolveDiagnostics::default(),
        }
    }
}

impl Default for TierSnapshot {
    fn default() -> Self {
        Self::loading()
    }
}
