use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::auth_handlers::current_user;
use crate::error::ApiError;
use crate::message_service::MessageService;
use crate::middleware::RequireAuth;
use crate::models::SendMessageRequest;
use crate::services::UserService;

// GET /api/messages/chat/{chat_id}
pub async fn list_messages(
    req: HttpRequest,
    path: web::Path<Uuid>,
    user_service: web::Data<UserService>,
    message_service: web::Data<MessageService>,
) -> Result<HttpResponse, ApiError> {
    let caller = current_user(&req, &user_service).await?;
    let messages = message_service
        .list_messages(&caller, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

// POST /api/messages/chat/{chat_id}
pub async fn send_message(
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<SendMessageRequest>,
    user_service: web::Data<UserService>,
    message_service: web::Data<MessageService>,
) -> Result<HttpResponse, ApiError> {
    let request = request.trimmed();
    if let Err(errors) = request.validate() {
        return Err(ApiError::bad_request(format!("Validation error: {}", errors)));
    }

    let caller = current_user(&req, &user_service).await?;
    let message = message_service
        .send_message(&caller, path.into_inner(), &request.text)
        .await?;
    Ok(HttpResponse::Created().json(message))
}

pub fn configure_message_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .wrap(RequireAuth)
            .route("/chat/{chat_id}", web::get().to(list_messages))
            .route("/chat/{chat_id}", web::post().to(send_message)),
    );
}
