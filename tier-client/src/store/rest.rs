//! REST store - network communication
//!
//! Speaks PostgREST conventions against the backing store: filtered reads on
//! `profiles` and `subscriptions`, an `rpc/` procedure call, and an
//! idempotent upsert for lazy profile creation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{ProfileCreate, ProfileRecord, SubscriptionRecord};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::TierStore;

const PROFILE_COLUMNS: &str = "id,email,auth_id";
const SUBSCRIPTION_COLUMNS: &str = "tier,created_at,user_id";

/// Network REST store
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
}

impl RestStore {
    /// Create a new REST store from configuration
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token: config.token.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn apply_headers(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key);
        }
        if let Some(token) = &self.token {
            req = req.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return match status {
                StatusCode::UNAUTHORIZED => Err(StoreError::Unauthorized),
                StatusCode::FORBIDDEN => Err(StoreError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(StoreError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(StoreError::Validation(text)),
                _ => Err(StoreError::Internal(text)),
            };
        }
        Ok(response.json().await?)
    }

    async fn select_profiles(&self, email_filter: &str) -> StoreResult<Vec<ProfileRecord>> {
        let url = format!("{}/rest/v1/profiles", self.base_url);
        let req = self.client.get(&url).query(&[
            ("select", PROFILE_COLUMNS),
            ("email", email_filter),
        ]);
        let response = self.apply_headers(req).send().await?;
        Self::handle_response(response).await
    }
}

#[async_trait]
impl TierStore for RestStore {
    async fn find_profile_exact(&self, email: &str) -> StoreResult<Option<ProfileRecord>> {
        let rows = self.select_profiles(&format!("eq.{}", email)).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_profiles_ci(&self, email: &str) -> StoreResult<Vec<ProfileRecord>> {
        // ilike without wildcards: case-insensitive literal match
        self.select_profiles(&format!("ilike.{}", email)).await
    }

    async fn lookup_auth_user_by_email(&self, encoded_email: &str) -> StoreResult<Option<String>> {
        let url = format!("{}/rest/v1/rpc/get_auth_user_by_email", self.base_url);
        let req = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email_input": encoded_email }));
        let response = self.apply_headers(req).send().await?;
        let value: serde_json::Value = Self::handle_response(response).await?;

        // Scalar RPC returns a string or null; some deployments wrap it in a
        // one-element array.
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(id) if !id.is_empty() => Ok(Some(id)),
            serde_json::Value::String(_) => Ok(None),
            serde_json::Value::Array(items) => Ok(items
                .into_iter()
                .next()
                .and_then(|v| v.as_str().map(String::from))),
            other => Err(StoreError::InvalidResponse(format!(
                "unexpected rpc payload: {}",
                other
            ))),
        }
    }

    async fn upsert_profile(&self, profile: &ProfileCreate) -> StoreResult<ProfileRecord> {
        let url = format!("{}/rest/v1/profiles", self.base_url);
        let req = self
            .client
            .post(&url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(profile);
        let response = self.apply_headers(req).send().await?;
        let rows: Vec<ProfileRecord> = Self::handle_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("upsert returned no row".into()))
    }

    async fn latest_subscription(&self, auth_id: &str) -> StoreResult<Option<SubscriptionRecord>> {
        let url = format!("{}/rest/v1/subscriptions", self.base_url);
        let filter = format!("eq.{}", auth_id);
        let req = self.client.get(&url).query(&[
            ("select", SUBSCRIPTION_COLUMNS),
            ("user_id", filter.as_str()),
            ("order", "created_at.desc"),
            ("limit", "1"),
        ]);
        let response = self.apply_headers(req).send().await?;
        let rows: Vec<SubscriptionRecord> = Self::handle_response(response).await?;
        Ok(rows.into_iter().next())
    }
}
