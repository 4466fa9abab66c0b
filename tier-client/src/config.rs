//! Store configuration

/// Configuration for connecting to the backing store's REST API
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend base URL (e.g., "https://project.example.co")
    pub base_url: String,

    /// Project API key, sent as the `apikey` header
    pub api_key: Option<String>,

    /// Bearer token for the authenticated user (row-level policies apply)
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl StoreConfig {
    /// Create a new configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            token: None,
            timeout: 30,
        }
    }

    /// Set the project API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the user bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Create a REST store from this configuration
    pub fn build_rest_store(&self) -> Result<super::RestStore, super::StoreError> {
        super::RestStore::new(self)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321")
    }
}
