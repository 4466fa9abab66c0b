//! RestStore integration tests against an in-process mock backend.
//!
//! The mock speaks just enough PostgREST for the resolver: filtered reads on
//! `profiles` and `subscriptions`, the `get_auth_user_by_email` procedure,
//! and the merge-duplicates upsert.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use shared::{ProfileRecord, SubscriptionRecord, UserIdentity, FREE_TIER};
use tier_client::{StoreConfig, TierResolver, TierStore};

#[derive(Default)]
struct MockState {
    profiles: Mutex<Vec<ProfileRecord>>,
    subscriptions: Mutex<Vec<SubscriptionRecord>>,
    /// plain email -> auth id, as the server-side function would resolve it
    auth_users: Mutex<HashMap<String, String>>,
    deny_insert: AtomicBool,
}

async fn list_profiles(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<ProfileRecord>> {
    let filter = params.get("email").cloned().unwrap_or_default();
    let profiles = state.profiles.lock().unwrap();
    let rows = if let Some(email) = filter.strip_prefix("eq.") {
        profiles.iter().filter(|p| p.email == email).cloned().collect()
    } else if let Some(email) = filter.strip_prefix("ilike.") {
        let needle = email.to_lowercase();
        profiles
            .iter()
            .filter(|p| p.email.to_lowercase() == needle)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    Json(rows)
}

async fn upsert_profile(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if state.deny_insert.load(Ordering::SeqCst) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "message": "new row violates row-level security policy for table \"profiles\""
            })),
        )
            .into_response();
    }

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let auth_id = body["auth_id"].as_str().unwrap_or_default().to_string();

    let mut profiles = state.profiles.lock().unwrap();
    if let Some(existing) = profiles.iter_mut().find(|p| p.email == email) {
        existing.auth_id = auth_id;
        return Json(vec![existing.clone()]).into_response();
    }
    let row = ProfileRecord {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        auth_id,
    };
    profiles.push(row.clone());
    Json(vec![row]).into_response()
}

async fn rpc_get_auth_user(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let encoded = body["email_input"].as_str().unwrap_or_default();
    let email = urlencoding::decode(encoded).map(|s| s.into_owned()).unwrap_or_default();
    let auth_users = state.auth_users.lock().unwrap();
    match auth_users.get(&email) {
        Some(id) => Json(serde_json::Value::String(id.clone())),
        None => Json(serde_json::Value::Null),
    }
}

async fn list_subscriptions(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<SubscriptionRecord>> {
    let filter = params.get("user_id").cloned().unwrap_or_default();
    let user_id = filter.strip_prefix("eq.").unwrap_or_default();
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(usize::MAX);

    let subscriptions = state.subscriptions.lock().unwrap();
    let mut rows: Vec<SubscriptionRecord> = subscriptions
        .iter()
        .filter(|s| s.user_id == user_id)
        .cloned()
        .collect();
    if params.get("order").map(String::as_str) == Some("created_at.desc") {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
    rows.truncate(limit);
    Json(rows)
}

async fn spawn_mock(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/rest/v1/profiles", get(list_profiles).post(upsert_profile))
        .route("/rest/v1/rpc/get_auth_user_by_email", post(rpc_get_auth_user))
        .route("/rest/v1/subscriptions", get(list_subscriptions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn resolver_for(base_url: &str) -> TierResolver {
    let store = StoreConfig::new(base_url)
        .with_api_key("test-key")
        .with_token("test-token")
        .build_rest_store()
        .unwrap();
    TierResolver::new(Arc::new(store))
}

#[tokio::test]
async fn exact_match_resolves_newest_tier_over_rest() {
    let state = Arc::new(MockState::default());
    state.profiles.lock().unwrap().push(ProfileRecord {
        id: "p-1".into(),
        email: "user@example.com".into(),
        auth_id: "auth-1".into(),
    });
    {
        let now = shared::util::now_millis();
        let mut subs = state.subscriptions.lock().unwrap();
        subs.push(SubscriptionRecord::new("basic", now - 1_000, "auth-1"));
        subs.push(SubscriptionRecord::new("pro", now, "auth-1"));
    }
    let base = spawn_mock(state).await;

    let snap = resolver_for(&base)
        .resolve(&UserIdentity::new("auth-1", "user@example.com"))
        .await;
    assert_eq!(snap.tier, "pro");
    assert_eq!(snap.diagnostics.profile_lookup_stages, vec!["exact: hit"]);
    assert_eq!(snap.diagnostics.final_tier.as_deref(), Some("pro"));
}

#[tokio::test]
async fn case_insensitive_and_rpc_stages_work_over_rest() {
    let state = Arc::new(MockState::default());
    state.profiles.lock().unwrap().push(ProfileRecord {
        id: "p-1".into(),
        email: "User@Example.com".into(),
        auth_id: "auth-1".into(),
    });
    let base = spawn_mock(state.clone()).await;
    let resolver = resolver_for(&base);

    let snap = resolver
        .resolve(&UserIdentity::new("auth-1", "user@example.com"))
        .await;
    assert_eq!(
        snap.diagnostics.profile_lookup_stages,
        vec!["exact: miss", "case_insensitive: hit"]
    );

    // second casing of the same address makes the match ambiguous; the RPC
    // takes over
    state.profiles.lock().unwrap().push(ProfileRecord {
        id: "p-2".into(),
        email: "USER@example.com".into(),
        auth_id: "auth-2".into(),
    });
    state
        .auth_users
        .lock()
        .unwrap()
        .insert("user@example.com".into(), "auth-1".into());

    let snap = resolver
        .resolve(&UserIdentity::new("auth-1", "user@example.com"))
        .await;
    assert_eq!(
        snap.diagnostics.profile_lookup_stages,
        vec!["exact: miss", "case_insensitive: ambiguous (2)", "rpc: hit"]
    );
}

#[tokio::test]
async fn missing_profile_is_created_through_upsert() {
    let state = Arc::new(MockState::default());
    let base = spawn_mock(state.clone()).await;

    let snap = resolver_for(&base)
        .resolve(&UserIdentity::new("auth-9", "new@example.com"))
        .await;
    assert_eq!(snap.tier, FREE_TIER);
    assert_eq!(snap.diagnostics.final_tier.as_deref(), Some(FREE_TIER));
    assert_eq!(
        snap.diagnostics.profile_lookup_stages.last().map(String::as_str),
        Some("create: created")
    );

    let profiles = state.profiles.lock().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].email, "new@example.com");
    assert_eq!(profiles[0].auth_id, "auth-9");
}

#[tokio::test]
async fn rls_rejection_maps_to_forbidden_and_fatal_diagnostic() {
    let state = Arc::new(MockState::default());
    state.deny_insert.store(true, Ordering::SeqCst);
    let base = spawn_mock(state).await;

    let snap = resolver_for(&base)
        .resolve(&UserIdentity::new("auth-9", "new@example.com"))
        .await;
    assert_eq!(snap.tier, FREE_TIER);
    let err = snap.diagnostics.profile_error.expect("profile error");
    assert!(err.contains("Permission denied"));
    assert!(snap.diagnostics.final_tier.is_none());
}

#[tokio::test]
async fn store_methods_encode_filters_correctly() {
    let state = Arc::new(MockState::default());
    state.profiles.lock().unwrap().push(ProfileRecord {
        id: "p-1".into(),
        email: "plus+tag@example.com".into(),
        auth_id: "auth-1".into(),
    });
    state
        .auth_users
        .lock()
        .unwrap()
        .insert("plus+tag@example.com".into(), "auth-1".into());
    let base = spawn_mock(state).await;
    let store = StoreConfig::new(&base).build_rest_store().unwrap();

    // address survives query-string encoding on the filtered read
    let found = store.find_profile_exact("plus+tag@example.com").await.unwrap();
    assert_eq!(found.map(|p| p.id), Some("p-1".to_string()));

    // and the RPC round-trips the URL-encoded argument
    let encoded = urlencoding::encode("plus+tag@example.com");
    let id = store.lookup_auth_user_by_email(&encoded).await.unwrap();
    assert_eq!(id.as_deref(), Some("auth-1"));
}
