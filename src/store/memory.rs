use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{direct_participants, Chat, Message, NewMessage, NewUser, User};

use super::{ChatStore, MessageStore, StoreResult, UserStore};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    users_by_clerk_id: HashMap<String, Uuid>,
    chats: HashMap<Uuid, Chat>,
    chats_by_participants: HashMap<Vec<Uuid>, Uuid>,
    messages: Vec<Message>,
}

// In-process store. Every operation runs under one lock, so the
// get-or-create paths are atomic the same way the unique indexes make
// them atomic in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.state().users.len()
    }

    pub fn chat_count(&self) -> usize {
        self.state().chats.len()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> StoreResult<Option<User>> {
        let state = self.state();
        Ok(state
            .users_by_clerk_id
            .get(clerk_id)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn insert_user_if_absent(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state();

        if let Some(existing) = state
            .users_by_clerk_id
            .get(&new_user.clerk_id)
            .and_then(|id| state.users.get(id))
        {
            return Ok(existing.clone());
        }

        let user = new_user.into_user(Utc::now());
        state.users_by_clerk_id.insert(user.clerk_id.clone(), user.id);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users_except(&self, exclude: Uuid) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self
            .state()
            .users
            .values()
            .filter(|user| user.id != exclude)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_chat(&self, id: Uuid) -> StoreResult<Option<Chat>> {
        Ok(self.state().chats.get(&id).cloned())
    }

    async fn list_chats_for(&self, user_id: Uuid) -> StoreResult<Vec<Chat>> {
        let mut chats: Vec<Chat> = self
            .state()
            .chats
            .values()
            .filter(|chat| chat.has_participant(user_id))
            .cloned()
            .collect();
        // None sorts before Some, so reverse to put active chats first
        chats.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(chats)
    }

    async fn get_or_create_direct_chat(&self, a: Uuid, b: Uuid) -> StoreResult<Chat> {
        let participants = direct_participants(a, b);
        let mut state = self.state();

        if let Some(existing) = state
            .chats_by_participants
            .get(&participants)
            .and_then(|id| state.chats.get(id))
        {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            participants: participants.clone(),
            last_message_id: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        };
        state.chats_by_participants.insert(participants, chat.id);
        state.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn record_last_message(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Only move forward; a slower writer must not restore an older message
        if let Some(chat) = self
            .state()
            .chats
            .get_mut(&chat_id)
            .filter(|chat| chat.last_message_at.map_or(true, |current| current <= at))
        {
            chat.last_message_id = Some(message_id);
            chat.last_message_at = Some(at);
            chat.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, new_message: NewMessage) -> StoreResult<Message> {
        let mut state = self.state();
        // Stamped under the lock so insertion order matches created_at
        let message = new_message.into_message(Utc::now());
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>> {
        Ok(self
            .state()
            .messages
            .iter()
            .find(|message| message.id == id)
            .cloned())
    }

    async fn list_messages(&self, chat_id: Uuid) -> StoreResult<Vec<Message>> {
        // Insertion order is already chronological
        Ok(self
            .state()
            .messages
            .iter()
            .filter(|message| message.chat_id == chat_id)
            .cloned()
            .collect())
    }
}
