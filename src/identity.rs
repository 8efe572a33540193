//! Identity provider capability.
//!
//! Identity Sync only needs one call from the provider: fetch the profile
//! for an external identity id. [`ClerkClient`] implements it against a
//! Clerk-compatible backend API.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub emails: Vec<String>,
    pub image_url: String,
}

impl IdentityProfile {
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    /// "First Last" when a first name is set, otherwise the local part of
    /// the first email address.
    pub fn display_name(&self) -> Option<String> {
        match self.first_name.as_deref().filter(|first| !first.is_empty()) {
            Some(first) => {
                let last = self.last_name.as_deref().unwrap_or("");
                Some(format!("{} {}", first, last).trim().to_string())
            }
            None => self
                .primary_email()
                .and_then(|email| email.split('@').next())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider secret key is not configured")]
    NotConfigured,

    #[error("unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("identity provider returned status {0}")]
    Status(u16),

    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_profile(&self, identity_id: &str) -> Result<IdentityProfile, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    image_url: Option<String>,
}

impl From<ClerkUser> for IdentityProfile {
    fn from(user: ClerkUser) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            emails: user
                .email_addresses
                .into_iter()
                .map(|address| address.email_address)
                .collect(),
            image_url: user.image_url.unwrap_or_default(),
        }
    }
}

pub struct ClerkClient {
    http: HttpClient,
    api_url: String,
    secret_key: Option<String>,
}

impl ClerkClient {
    pub fn new(api_url: impl Into<String>, secret_key: Option<String>) -> Self {
        Self {
            http: HttpClient::new(),
            api_url: api_url.into(),
            secret_key,
        }
    }

    fn user_url(&self, identity_id: &str) -> String {
        format!(
            "{}/users/{}",
            self.api_url.trim_end_matches('/'),
            urlencoding::encode(identity_id)
        )
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn get_profile(&self, identity_id: &str) -> Result<IdentityProfile, IdentityError> {
        let secret_key = self.secret_key.as_deref().ok_or(IdentityError::NotConfigured)?;

        let response = self
            .http
            .get(self.user_url(identity_id))
            .bearer_auth(secret_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::UnknownIdentity(identity_id.to_string())),
            status if !status.is_success() => Err(IdentityError::Status(status.as_u16())),
            _ => {
                let user = response.json::<ClerkUser>().await?;
                Ok(user.into())
            }
        }
    }
}
