use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::ApiError;
use crate::middleware::{get_identity_from_request, RequireAuth};
use crate::models::User;
use crate::services::UserService;

// POST /api/auth/callback: get-or-create of the caller's user record
pub async fn auth_callback(
    req: HttpRequest,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, ApiError> {
    let claims = get_identity_from_request(&req).ok_or(ApiError::Unauthorized)?;

    // Failures are logged once, when the ApiError is rendered
    let user = user_service.sync_identity(&claims.sub).await?;

    Ok(HttpResponse::Ok().json(user))
}

// GET /api/auth/me
pub async fn me(
    req: HttpRequest,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, ApiError> {
    let user = current_user(&req, &user_service).await?;
    Ok(HttpResponse::Ok().json(user))
}

// The caller's own record; 404 until the auth callback has created it
pub async fn current_user(req: &HttpRequest, user_service: &UserService) -> Result<User, ApiError> {
    let claims = get_identity_from_request(req).ok_or(ApiError::Unauthorized)?;

    user_service
        .get_user_by_clerk_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/callback", web::post().to(auth_callback))
            .service(
                web::resource("/me")
                    .wrap(RequireAuth)
                    .route(web::get().to(me)),
            ),
    );
}
