use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{direct_participants, Chat, Message, NewMessage, NewUser, User};

use super::{ChatStore, MessageStore, StoreError, StoreResult, UserStore};

const USER_COLUMNS: &str = "id, clerk_id, name, email, avatar, created_at, updated_at";
const CHAT_COLUMNS: &str = "id, participants, last_message_id, last_message_at, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, text, created_at, updated_at";

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE clerk_id = $1"
        ))
        .bind(clerk_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user_if_absent(&self, new_user: NewUser) -> StoreResult<User> {
        let now = Utc::now();

        // The unique index on clerk_id turns a concurrent duplicate into a no-op
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, clerk_id, name, email, avatar, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (clerk_id) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.clerk_id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.avatar)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(user) => Ok(user),
            None => self
                .find_user_by_clerk_id(&new_user.clerk_id)
                .await?
                .ok_or_else(|| StoreError::Missing(format!("user {}", new_user.clerk_id))),
        }
    }

    async fn list_users_except(&self, exclude: Uuid) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id <> $1 ORDER BY name"
        ))
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn find_chat(&self, id: Uuid) -> StoreResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn list_chats_for(&self, user_id: Uuid) -> StoreResult<Vec<Chat>> {
        let chats = sqlx::query_as::<_, Chat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS} FROM chats
            WHERE $1 = ANY(participants)
            ORDER BY last_message_at DESC NULLS LAST, created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chats)
    }

    async fn get_or_create_direct_chat(&self, a: Uuid, b: Uuid) -> StoreResult<Chat> {
        let participants = direct_participants(a, b);
        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Chat>(&format!(
            r#"
            INSERT INTO chats (id, participants, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (participants) DO NOTHING
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&participants)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(chat) = inserted {
            return Ok(chat);
        }

        sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE participants = $1"
        ))
        .bind(&participants)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Missing(format!("chat {:?}", participants)))
    }

    async fn record_last_message(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Older messages finishing late leave the pointer alone
        sqlx::query(
            r#"
            UPDATE chats
            SET last_message_id = $2, last_message_at = $3, updated_at = $4
            WHERE id = $1 AND (last_message_at IS NULL OR last_message_at <= $3)
            "#,
        )
        .bind(chat_id)
        .bind(message_id)
        .bind(at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, new_message: NewMessage) -> StoreResult<Message> {
        let now = Utc::now();

        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, text, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new_message.chat_id)
        .bind(new_message.sender_id)
        .bind(&new_message.text)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn list_messages(&self, chat_id: Uuid) -> StoreResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = $1 ORDER BY created_at ASC"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
