mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chat_backend::chat_service::{ChatError, ChatService};
use chat_backend::identity::IdentityProfile;
use chat_backend::message_service::MessageService;
use chat_backend::models::{Chat, NewUser, User};
use chat_backend::services::{SyncError, UserService};
use chat_backend::store::{ChatStore, MemoryStore, StoreResult, UserStore};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use common::{ada_and_bob, profile, FakeProvider};

fn user_service(store: &Arc<MemoryStore>, provider: &Arc<FakeProvider>) -> UserService {
    UserService::new(store.clone(), provider.clone())
}

#[cfg(test)]
mod identity_sync_tests {
    use super::*;

    #[actix_web::test]
    async fn test_first_sync_creates_exactly_one_user() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ada_and_bob());
        let service = user_service(&store, &provider);

        let user = service.sync_identity("user_ada").await.unwrap();

        assert_eq!(store.user_count(), 1);
        assert_eq!(user.clerk_id, "user_ada");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@x.com");
        assert_eq!(user.avatar, "https://img.example.com/ada@x.com.png");
    }

    #[actix_web::test]
    async fn test_existing_user_is_returned_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ada_and_bob());
        let service = user_service(&store, &provider);

        let first = service.sync_identity("user_ada").await.unwrap();
        let second = service.sync_identity("user_ada").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.user_count(), 1);
        // The provider is only consulted on the create path
        assert_eq!(provider.calls(), 1);
    }

    #[actix_web::test]
    async fn test_name_falls_back_to_email_local_part() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ada_and_bob());
        let service = user_service(&store, &provider);

        let user = service.sync_identity("user_bob").await.unwrap();

        assert_eq!(user.name, "bob");
        assert_eq!(user.email, "bob@x.com");
    }

    #[actix_web::test]
    async fn test_profile_without_email_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeProvider::new().with_profile(
            "user_noemail",
            IdentityProfile {
                first_name: Some("Grace".to_string()),
                last_name: Some("Hopper".to_string()),
                emails: vec![],
                image_url: String::new(),
            },
        ));
        let service = user_service(&store, &provider);

        let result = service.sync_identity("user_noemail").await;

        assert!(matches!(result, Err(SyncError::MissingEmail)));
        assert_eq!(store.user_count(), 0);
    }

    #[actix_web::test]
    async fn test_provider_failure_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeProvider::new());
        let service = user_service(&store, &provider);

        let result = service.sync_identity("user_ghost").await;

        assert!(matches!(result, Err(SyncError::ProviderError(_))));
        assert_eq!(store.user_count(), 0);
    }

    #[actix_web::test]
    async fn test_concurrent_first_syncs_produce_one_user() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ada_and_bob().yielding());
        let service = user_service(&store, &provider);

        let (a, b) = futures::join!(
            service.sync_identity("user_ada"),
            service.sync_identity("user_ada")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        // Both callers missed the lookup, yet only one record exists
        assert_eq!(provider.calls(), 2);
        assert_eq!(store.user_count(), 1);
        assert_eq!(a.id, b.id);
    }
}

#[cfg(test)]
mod sync_error_tests {
    use super::*;

    #[test]
    fn test_missing_email_display() {
        let message = format!("{}", SyncError::MissingEmail);
        assert!(message.contains("email"));
    }
}

// User lookups suspend once so concurrent chat creations interleave
struct YieldingUsers(Arc<MemoryStore>);

#[async_trait]
impl UserStore for YieldingUsers {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        tokio::task::yield_now().await;
        self.0.find_user(id).await
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> StoreResult<Option<User>> {
        self.0.find_user_by_clerk_id(clerk_id).await
    }

    async fn insert_user_if_absent(&self, new_user: NewUser) -> StoreResult<User> {
        self.0.insert_user_if_absent(new_user).await
    }

    async fn list_users_except(&self, exclude: Uuid) -> StoreResult<Vec<User>> {
        self.0.list_users_except(exclude).await
    }
}

// Holds back the first last-message update until later sends have finished
struct LateFirstUpdate {
    inner: Arc<MemoryStore>,
    updates: AtomicUsize,
}

#[async_trait]
impl ChatStore for LateFirstUpdate {
    async fn find_chat(&self, id: Uuid) -> StoreResult<Option<Chat>> {
        self.inner.find_chat(id).await
    }

    async fn list_chats_for(&self, user_id: Uuid) -> StoreResult<Vec<Chat>> {
        self.inner.list_chats_for(user_id).await
    }

    async fn get_or_create_direct_chat(&self, a: Uuid, b: Uuid) -> StoreResult<Chat> {
        self.inner.get_or_create_direct_chat(a, b).await
    }

    async fn record_last_message(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if self.updates.fetch_add(1, Ordering::SeqCst) == 0 {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
        }
        self.inner.record_last_message(chat_id, message_id, at).await
    }
}

struct ChatFixture {
    chat_service: Arc<ChatService>,
    message_service: MessageService,
    store: Arc<MemoryStore>,
    ada: User,
    bob: User,
    eve: User,
}

async fn chat_fixture() -> ChatFixture {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(
        ada_and_bob().with_profile("user_eve", profile(Some("Eve"), None, "eve@x.com")),
    );
    let users = user_service(&store, &provider);

    let ada = users.sync_identity("user_ada").await.unwrap();
    let bob = users.sync_identity("user_bob").await.unwrap();
    let eve = users.sync_identity("user_eve").await.unwrap();

    let chat_service = Arc::new(ChatService::new(store.clone(), store.clone(), store.clone()));
    let message_service = MessageService::new(chat_service.clone(), store.clone(), store.clone());

    ChatFixture {
        chat_service,
        message_service,
        store,
        ada,
        bob,
        eve,
    }
}

#[cfg(test)]
mod chat_service_tests {
    use super::*;

    #[actix_web::test]
    async fn test_direct_chat_is_created_once_per_pair() {
        let f = chat_fixture().await;

        let first = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();
        let again = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();
        let reverse = f.chat_service.get_or_create_chat(&f.bob, f.ada.id).await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(first.id, reverse.id);
        assert_eq!(f.store.chat_count(), 1);
        assert_eq!(first.participant.as_ref().map(|u| u.id), Some(f.bob.id));
        assert_eq!(reverse.participant.as_ref().map(|u| u.id), Some(f.ada.id));
    }

    #[actix_web::test]
    async fn test_concurrent_creations_produce_one_chat() {
        let f = chat_fixture().await;
        let chat_service = ChatService::new(
            Arc::new(YieldingUsers(f.store.clone())),
            f.store.clone(),
            f.store.clone(),
        );

        let (a, b) = futures::join!(
            chat_service.get_or_create_chat(&f.ada, f.bob.id),
            chat_service.get_or_create_chat(&f.bob, f.ada.id)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(f.store.chat_count(), 1);
        assert_eq!(a.id, b.id);
        assert_eq!(a.participant.as_ref().map(|u| u.id), Some(f.bob.id));
        assert_eq!(b.participant.as_ref().map(|u| u.id), Some(f.ada.id));
    }

    #[actix_web::test]
    async fn test_chat_with_self_is_rejected() {
        let f = chat_fixture().await;

        let result = f.chat_service.get_or_create_chat(&f.ada, f.ada.id).await;

        assert!(matches!(result, Err(ChatError::SelfChat)));
        assert_eq!(f.store.chat_count(), 0);
    }

    #[actix_web::test]
    async fn test_chat_with_unknown_participant_is_rejected() {
        let f = chat_fixture().await;

        let result = f.chat_service.get_or_create_chat(&f.ada, Uuid::new_v4()).await;

        assert!(matches!(result, Err(ChatError::ParticipantNotFound)));
    }

    #[actix_web::test]
    async fn test_chat_list_puts_recent_activity_first() {
        let f = chat_fixture().await;
        let with_bob = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();
        let with_eve = f.chat_service.get_or_create_chat(&f.ada, f.eve.id).await.unwrap();

        f.message_service
            .send_message(&f.ada, with_bob.id, "hello bob")
            .await
            .unwrap();

        let chats = f.chat_service.list_chats(&f.ada).await.unwrap();

        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, with_bob.id);
        assert_eq!(chats[1].id, with_eve.id);
        assert_eq!(
            chats[0].last_message.as_ref().map(|m| m.text.as_str()),
            Some("hello bob")
        );
        assert!(chats[1].last_message.is_none());
    }
}

#[cfg(test)]
mod message_service_tests {
    use super::*;

    #[actix_web::test]
    async fn test_message_text_is_trimmed() {
        let f = chat_fixture().await;
        let chat = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();

        let message = f
            .message_service
            .send_message(&f.ada, chat.id, "  hi there \n")
            .await
            .unwrap();

        assert_eq!(message.text, "hi there");
        assert_eq!(message.sender_id, f.ada.id);
        assert_eq!(message.chat_id, chat.id);
    }

    #[actix_web::test]
    async fn test_blank_message_is_rejected() {
        let f = chat_fixture().await;
        let chat = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();

        let result = f.message_service.send_message(&f.ada, chat.id, "   ").await;

        assert!(matches!(result, Err(ChatError::EmptyMessage)));
        assert!(f.message_service.list_messages(&f.ada, chat.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_outsider_cannot_read_or_write() {
        let f = chat_fixture().await;
        let chat = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();

        let read = f.message_service.list_messages(&f.eve, chat.id).await;
        let write = f.message_service.send_message(&f.eve, chat.id, "hi").await;

        assert!(matches!(read, Err(ChatError::NotParticipant)));
        assert!(matches!(write, Err(ChatError::NotParticipant)));
    }

    #[actix_web::test]
    async fn test_unknown_chat_is_reported() {
        let f = chat_fixture().await;

        let result = f.message_service.send_message(&f.ada, Uuid::new_v4(), "hi").await;

        assert!(matches!(result, Err(ChatError::ChatNotFound)));
    }

    #[actix_web::test]
    async fn test_history_is_chronological() {
        let f = chat_fixture().await;
        let chat = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();

        for (sender, text) in [(&f.ada, "one"), (&f.bob, "two"), (&f.ada, "three")] {
            f.message_service.send_message(sender, chat.id, text).await.unwrap();
        }

        let history = f.message_service.list_messages(&f.bob, chat.id).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();

        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(history[1].sender_id, f.bob.id);
    }

    #[actix_web::test]
    async fn test_concurrent_sends_keep_the_newest_as_last_message() {
        let f = chat_fixture().await;
        let chat = f.chat_service.get_or_create_chat(&f.ada, f.bob.id).await.unwrap();
        let message_service = MessageService::new(
            f.chat_service.clone(),
            Arc::new(LateFirstUpdate {
                inner: f.store.clone(),
                updates: AtomicUsize::new(0),
            }),
            f.store.clone(),
        );

        let (first, second) = futures::join!(
            message_service.send_message(&f.ada, chat.id, "first"),
            message_service.send_message(&f.bob, chat.id, "second")
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(first.created_at < second.created_at);

        let stored = f.store.find_chat(chat.id).await.unwrap().unwrap();
        assert_eq!(stored.last_message_id, Some(second.id));
        assert_eq!(stored.last_message_at, Some(second.created_at));

        let chats = f.chat_service.list_chats(&f.ada).await.unwrap();
        assert_eq!(
            chats[0].last_message.as_ref().map(|m| m.text.as_str()),
            Some("second")
        );
    }
}

#[cfg(test)]
mod memory_store_tests {
    use super::*;
    use chat_backend::models::NewMessage;
    use chat_backend::store::MessageStore;

    #[actix_web::test]
    async fn test_older_message_does_not_replace_newer() {
        let f = chat_fixture().await;
        let chat = f.store.get_or_create_direct_chat(f.ada.id, f.bob.id).await.unwrap();
        let newer = Uuid::new_v4();
        let older = Uuid::new_v4();
        let now = Utc::now();

        f.store.record_last_message(chat.id, newer, now).await.unwrap();
        f.store
            .record_last_message(chat.id, older, now - chrono::Duration::seconds(1))
            .await
            .unwrap();

        let stored = f.store.find_chat(chat.id).await.unwrap().unwrap();
        assert_eq!(stored.last_message_id, Some(newer));
        assert_eq!(stored.last_message_at, Some(now));
    }

    #[actix_web::test]
    async fn test_messages_are_listed_in_created_order() {
        let f = chat_fixture().await;
        let chat = f.store.get_or_create_direct_chat(f.ada.id, f.bob.id).await.unwrap();

        for text in ["one", "two", "three", "four"] {
            f.store
                .insert_message(NewMessage {
                    chat_id: chat.id,
                    sender_id: f.ada.id,
                    text: text.to_string(),
                })
                .await
                .unwrap();
        }

        let history = f.store.list_messages(chat.id).await.unwrap();
        assert!(history
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at));
    }
}
