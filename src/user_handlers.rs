use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth_handlers::current_user;
use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::services::UserService;

// GET /api/users: everyone except the caller
pub async fn list_users(
    req: HttpRequest,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, ApiError> {
    let caller = current_user(&req, &user_service).await?;
    let users = user_service.list_other_users(caller.id).await?;
    Ok(HttpResponse::Ok().json(users))
}

pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .wrap(RequireAuth)
            .route("", web::get().to(list_users)),
    );
}
