// tier-client/examples/resolve_tier.rs
// Resolve a user's subscription tier against a live backend

use std::sync::Arc;

use tier_client::{StoreConfig, TierResolver, UserIdentity};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        println!("Usage: {} <auth_id> <email>", args[0]);
        println!("  Example: {} 6f1e... user@example.com", args[0]);
        return Ok(());
    }

    let base_url =
        std::env::var("TIER_BASE_URL").unwrap_or_else(|_| "http://localhost:54321".to_string());
    let mut config = StoreConfig::new(&base_url);
    if let Ok(key) = std::env::var("TIER_API_KEY") {
        config = config.with_api_key(key);
    }
    if let Ok(token) = std::env::var("TIER_TOKEN") {
        config = config.with_token(token);
    }

    let store = config.build_rest_store()?;
    let resolver = TierResolver::new(Arc::new(store));

    let identity = UserIdentity::new(&args[1], &args[2]);
    let snapshot = resolver.resolve(&identity).await;

    tracing::info!(tier = %snapshot.tier, "resolved");
    for stage in &snapshot.diagnostics.profile_lookup_stages {
        tracing::info!("stage: {}", stage);
    }
    if let Some(err) = &snapshot.diagnostics.profile_error {
        tracing::error!("profile error: {}", err);
    }
    if let Some(err) = &snapshot.diagnostics.subscription_error {
        tracing::error!("subscription error: {}", err);
    }

    Ok(())
}
