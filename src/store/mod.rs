//! Record storage behind the services.
//!
//! Services only see the [`UserStore`], [`ChatStore`] and [`MessageStore`]
//! traits. [`postgres::PgStore`] backs them with a sqlx pool and
//! [`memory::MemoryStore`] keeps everything in process.
//!
//! Both get-or-create operations (`insert_user_if_absent`,
//! `get_or_create_direct_chat`) are atomic: concurrent callers with the same
//! key all receive the same record.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Chat, Message, NewMessage, NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record not found after insert: {0}")]
    Missing(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> StoreResult<Option<User>>;

    /// Inserts the user unless one with the same `clerk_id` exists, and
    /// returns whichever record is stored for that id afterwards.
    async fn insert_user_if_absent(&self, new_user: NewUser) -> StoreResult<User>;

    /// Every user except `exclude`, ordered by name.
    async fn list_users_except(&self, exclude: Uuid) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_chat(&self, id: Uuid) -> StoreResult<Option<Chat>>;

    /// Chats `user_id` takes part in, most recent activity first.
    async fn list_chats_for(&self, user_id: Uuid) -> StoreResult<Vec<Chat>>;

    async fn get_or_create_direct_chat(&self, a: Uuid, b: Uuid) -> StoreResult<Chat>;

    /// Points the chat at `message_id` unless it already holds a message
    /// newer than `at`.
    async fn record_last_message(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, new_message: NewMessage) -> StoreResult<Message>;

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>>;

    /// Messages of a chat in chronological order.
    async fn list_messages(&self, chat_id: Uuid) -> StoreResult<Vec<Message>>;
}
