use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Chat, ChatView, User};
use crate::store::{ChatStore, MessageStore, StoreError, UserStore};

#[derive(Debug)]
pub enum ChatError {
    StoreError(StoreError),
    ChatNotFound,
    ParticipantNotFound,
    NotParticipant,
    SelfChat,
    EmptyMessage,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::StoreError(e) => write!(f, "Store error: {}", e),
            ChatError::ChatNotFound => write!(f, "Chat not found"),
            ChatError::ParticipantNotFound => write!(f, "Participant not found"),
            ChatError::NotParticipant => write!(f, "You are not a participant of this chat"),
            ChatError::SelfChat => write!(f, "Cannot start a chat with yourself"),
            ChatError::EmptyMessage => write!(f, "Message text is required"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        ChatError::StoreError(e)
    }
}

pub struct ChatService {
    users: Arc<dyn UserStore>,
    chats: Arc<dyn ChatStore>,
    messages: Arc<dyn MessageStore>,
}

impl ChatService {
    pub fn new(
        users: Arc<dyn UserStore>,
        chats: Arc<dyn ChatStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self { users, chats, messages }
    }

    pub async fn list_chats(&self, caller: &User) -> Result<Vec<ChatView>, ChatError> {
        let chats = self.chats.list_chats_for(caller.id).await?;

        let mut views = Vec::with_capacity(chats.len());
        for chat in chats {
            views.push(self.view(chat, caller.id).await?);
        }
        Ok(views)
    }

    // Get-or-create of the direct chat between the caller and a participant
    pub async fn get_or_create_chat(
        &self,
        caller: &User,
        participant_id: Uuid,
    ) -> Result<ChatView, ChatError> {
        if participant_id == caller.id {
            return Err(ChatError::SelfChat);
        }

        if self.users.find_user(participant_id).await?.is_none() {
            return Err(ChatError::ParticipantNotFound);
        }

        let chat = self
            .chats
            .get_or_create_direct_chat(caller.id, participant_id)
            .await?;
        self.view(chat, caller.id).await
    }

    // Loads a chat the caller takes part in
    pub async fn get_chat_for(&self, caller: &User, chat_id: Uuid) -> Result<Chat, ChatError> {
        let chat = self
            .chats
            .find_chat(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)?;

        if !chat.has_participant(caller.id) {
            return Err(ChatError::NotParticipant);
        }
        Ok(chat)
    }

    async fn view(&self, chat: Chat, caller_id: Uuid) -> Result<ChatView, ChatError> {
        let participant = match chat.other_participant(caller_id) {
            Some(other) => self.users.find_user(other).await?,
            None => None,
        };

        let last_message = match chat.last_message_id {
            Some(message_id) => self.messages.find_message(message_id).await?,
            None => None,
        };

        Ok(ChatView {
            id: chat.id,
            participant,
            last_message,
            last_message_at: chat.last_message_at,
            created_at: chat.created_at,
        })
    }
}
