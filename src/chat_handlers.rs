use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::auth_handlers::current_user;
use crate::chat_service::ChatService;
use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::services::UserService;

// GET /api/chats
pub async fn list_chats(
    req: HttpRequest,
    user_service: web::Data<UserService>,
    chat_service: web::Data<ChatService>,
) -> Result<HttpResponse, ApiError> {
    let caller = current_user(&req, &user_service).await?;
    let chats = chat_service.list_chats(&caller).await?;
    Ok(HttpResponse::Ok().json(chats))
}

// POST /api/chats/with/{participant_id}
pub async fn get_or_create_chat(
    req: HttpRequest,
    path: web::Path<Uuid>,
    user_service: web::Data<UserService>,
    chat_service: web::Data<ChatService>,
) -> Result<HttpResponse, ApiError> {
    let caller = current_user(&req, &user_service).await?;
    let chat = chat_service
        .get_or_create_chat(&caller, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(chat))
}

pub fn configure_chat_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chats")
            .wrap(RequireAuth)
            .route("", web::get().to(list_chats))
            .route("/with/{participant_id}", web::post().to(get_or_create_chat)),
    );
}
