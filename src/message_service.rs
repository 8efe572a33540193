use std::sync::Arc;

use uuid::Uuid;

use crate::chat_service::{ChatError, ChatService};
use crate::models::{Message, NewMessage, User};
use crate::store::{ChatStore, MessageStore};

pub struct MessageService {
    chat_service: Arc<ChatService>,
    chats: Arc<dyn ChatStore>,
    messages: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(
        chat_service: Arc<ChatService>,
        chats: Arc<dyn ChatStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            chat_service,
            chats,
            messages,
        }
    }

    pub async fn list_messages(&self, caller: &User, chat_id: Uuid) -> Result<Vec<Message>, ChatError> {
        let chat = self.chat_service.get_chat_for(caller, chat_id).await?;
        Ok(self.messages.list_messages(chat.id).await?)
    }

    // Stores a message and marks it as the chat's latest
    pub async fn send_message(
        &self,
        caller: &User,
        chat_id: Uuid,
        text: &str,
    ) -> Result<Message, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let chat = self.chat_service.get_chat_for(caller, chat_id).await?;

        let message = self
            .messages
            .insert_message(NewMessage {
                chat_id: chat.id,
                sender_id: caller.id,
                text: text.to_string(),
            })
            .await?;

        self.chats
            .record_last_message(chat.id, message.id, message.created_at)
            .await?;

        Ok(message)
    }
}
