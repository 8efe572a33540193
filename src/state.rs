//! Services shared by every worker, registered as actix app data.

use std::sync::Arc;

use actix_web::web;

use crate::chat_service::ChatService;
use crate::identity::IdentityProvider;
use crate::message_service::MessageService;
use crate::middleware::IdentityMiddleware;
use crate::services::UserService;
use crate::store::{ChatStore, MessageStore, UserStore};
use crate::token_service::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: web::Data<UserService>,
    pub chat_service: web::Data<ChatService>,
    pub message_service: web::Data<MessageService>,
    pub token_service: Arc<TokenService>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, identity: Arc<dyn IdentityProvider>, token_service: TokenService) -> Self
    where
        S: UserStore + ChatStore + MessageStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let chats: Arc<dyn ChatStore> = store.clone();
        let messages: Arc<dyn MessageStore> = store;

        let chat_service = Arc::new(ChatService::new(users.clone(), chats.clone(), messages.clone()));
        let message_service = MessageService::new(chat_service.clone(), chats, messages);

        Self {
            user_service: web::Data::new(UserService::new(users, identity)),
            chat_service: web::Data::from(chat_service),
            message_service: web::Data::new(message_service),
            token_service: Arc::new(token_service),
        }
    }

    pub fn identity_middleware(&self) -> IdentityMiddleware {
        IdentityMiddleware::new(self.token_service.clone())
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.user_service.clone())
            .app_data(self.chat_service.clone())
            .app_data(self.message_service.clone());
    }
}
