use actix_web::{error, web, HttpRequest, HttpResponse, Responder};

use crate::auth_handlers::configure_auth_routes;
use crate::chat_handlers::configure_chat_routes;
use crate::error::ApiError;
use crate::message_handlers::configure_message_routes;
use crate::models::MessageResponse;
use crate::user_handlers::configure_user_routes;

// Liveness check on the root path
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        message: "Server is working fine".to_string(),
    })
}

// Endpoint for health probes
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn route_not_found() -> impl Responder {
    HttpResponse::NotFound().json(MessageResponse {
        message: "Route not found".to_string(),
    })
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Invalid JSON body: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Invalid path parameter: {}", err)).into()
}

// Route table. Extractor error handlers and the fallback are registered
// here so every failure leaves as JSON with its status already set.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .route("/", web::get().to(liveness))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .configure(configure_auth_routes)
                .configure(configure_chat_routes)
                .configure(configure_message_routes)
                .configure(configure_user_routes),
        )
        .default_service(web::to(route_not_found));
}
