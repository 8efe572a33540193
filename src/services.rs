use std::fmt;
use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::{NewUser, User};
use crate::store::{StoreError, UserStore};

#[derive(Debug)]
pub enum SyncError {
    StoreError(StoreError),
    ProviderError(IdentityError),
    MissingEmail,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::StoreError(e) => write!(f, "Store error during identity sync: {}", e),
            SyncError::ProviderError(e) => write!(f, "Identity provider error during sync: {}", e),
            SyncError::MissingEmail => write!(f, "Identity profile has no email address"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::StoreError(e)
    }
}

impl From<IdentityError> for SyncError {
    fn from(e: IdentityError) -> Self {
        SyncError::ProviderError(e)
    }
}

pub struct UserService {
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    // Get-or-create of the local user for an external identity id
    pub async fn sync_identity(&self, clerk_id: &str) -> Result<User, SyncError> {
        if let Some(user) = self.store.find_user_by_clerk_id(clerk_id).await? {
            return Ok(user);
        }

        let profile = self.identity.get_profile(clerk_id).await?;
        let email = profile.primary_email().ok_or(SyncError::MissingEmail)?.to_string();
        let name = profile.display_name().unwrap_or_default();

        let user = self
            .store
            .insert_user_if_absent(NewUser {
                clerk_id: clerk_id.to_string(),
                name,
                email,
                avatar: profile.image_url,
            })
            .await?;

        info!("identity {} synced to user {}", clerk_id, user.id);
        Ok(user)
    }

    pub async fn get_user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, StoreError> {
        self.store.find_user_by_clerk_id(clerk_id).await
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        self.store.find_user(user_id).await
    }

    // Everyone the caller could start a chat with
    pub async fn list_other_users(&self, user_id: Uuid) -> Result<Vec<User>, StoreError> {
        self.store.list_users_except(user_id).await
    }
}
