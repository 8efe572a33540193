pub mod auth_handlers;
pub mod chat_handlers;
pub mod chat_service;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod message_handlers;
pub mod message_service;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod token_service;
pub mod user_handlers;
