#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chat_backend::identity::{IdentityError, IdentityProfile, IdentityProvider};
use chat_backend::state::AppState;
use chat_backend::store::MemoryStore;
use chat_backend::token_service::{IdentityClaims, TokenService};
use jsonwebtoken::{encode, EncodingKey, Header};

pub const TEST_SECRET: &str = "test-identity-secret";

// Identity provider answering from a fixed set of profiles
#[derive(Default)]
pub struct FakeProvider {
    profiles: HashMap<String, IdentityProfile>,
    calls: AtomicUsize,
    yield_before_reply: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, identity_id: &str, profile: IdentityProfile) -> Self {
        self.profiles.insert(identity_id.to_string(), profile);
        self
    }

    // Suspends once per call so concurrent syncs interleave
    pub fn yielding(mut self) -> Self {
        self.yield_before_reply = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn get_profile(&self, identity_id: &str) -> Result<IdentityProfile, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.yield_before_reply {
            tokio::task::yield_now().await;
        }
        self.profiles
            .get(identity_id)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownIdentity(identity_id.to_string()))
    }
}

pub fn profile(first: Option<&str>, last: Option<&str>, email: &str) -> IdentityProfile {
    IdentityProfile {
        first_name: first.map(str::to_string),
        last_name: last.map(str::to_string),
        emails: vec![email.to_string()],
        image_url: format!("https://img.example.com/{}.png", email),
    }
}

pub fn ada_and_bob() -> FakeProvider {
    FakeProvider::new()
        .with_profile("user_ada", profile(Some("Ada"), Some("Lovelace"), "ada@x.com"))
        .with_profile("user_bob", profile(None, None, "bob@x.com"))
}

pub fn test_state(store: Arc<MemoryStore>, provider: Arc<FakeProvider>) -> AppState {
    AppState::new(store, provider, TokenService::from_secret(TEST_SECRET.as_bytes()))
}

pub fn token_for(identity_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = IdentityClaims {
        sub: identity_id.to_string(),
        exp: now + 3600,
        iat: Some(now),
        sid: Some("sess_test".to_string()),
        azp: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(identity_id: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(identity_id)))
}
