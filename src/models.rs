use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// User record, keyed by the identity provider's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub clerk_id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Fields Identity Sync copies from the provider profile
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub clerk_id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            clerk_id: self.clerk_id,
            name: self.name,
            email: self.email,
            avatar: self.avatar,
            created_at: now,
            updated_at: now,
        }
    }
}

// Chat record; participants are stored sorted so a pair maps to one chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub participants: Vec<Uuid>,
    pub last_message_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        self.participants.iter().copied().find(|id| *id != user_id)
    }
}

// Sorted participant pair for a direct chat
pub fn direct_participants(a: Uuid, b: Uuid) -> Vec<Uuid> {
    if a <= b {
        vec![a, b]
    } else {
        vec![b, a]
    }
}

// Message record; immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "chat")]
    pub chat_id: Uuid,
    #[serde(rename = "sender")]
    pub sender_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
}

impl NewMessage {
    pub fn into_message(self, now: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            text: self.text,
            created_at: now,
            updated_at: now,
        }
    }
}

// DTO for sending a message
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message text must be between 1 and 2000 characters"))]
    pub text: String,
}

impl SendMessageRequest {
    pub fn trimmed(&self) -> SendMessageRequest {
        SendMessageRequest {
            text: self.text.trim().to_string(),
        }
    }
}

// Chat as shown in the caller's chat list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub participant: Option<User>,
    pub last_message: Option<Message>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Body for client-facing errors and plain notices
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// Body for internal errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
