use actix_web::{
    body::MessageBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use log::debug;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::models::MessageResponse;
use crate::token_service::{IdentityClaims, TokenService};

pub const SESSION_COOKIE: &str = "__session";

// Attaches verified identity claims to the request. Requests without a
// usable token pass through anonymously; RequireAuth decides what to reject.
pub struct IdentityMiddleware {
    token_service: Arc<TokenService>,
}

impl IdentityMiddleware {
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            token_service: self.token_service.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    token_service: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if let Some(token) = extract_session_token(&req) {
            match self.token_service.verify_jwt(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                }
                Err(e) => debug!("ignoring session token for {}: {}", req.path(), e),
            }
        }

        Box::pin(async move { service.call(req).await })
    }
}

// Bearer token from the Authorization header, falling back to the session cookie
fn extract_session_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    from_header.or_else(|| req.cookie(SESSION_COOKIE).map(|cookie| cookie.value().to_string()))
}

// Helper for reading the identity claims from a request
pub fn get_identity_from_request(req: &actix_web::HttpRequest) -> Option<IdentityClaims> {
    req.extensions().get::<IdentityClaims>().cloned()
}

// Auth gate for protected scopes; needs IdentityMiddleware further out
pub struct RequireAuth;

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let authenticated = req.extensions().contains::<IdentityClaims>();

            if !authenticated {
                let (http_req, _) = req.into_parts();
                let response = HttpResponse::Unauthorized().json(MessageResponse {
                    message: "Unauthorized - you must be logged in".to_string(),
                });
                return Ok(ServiceResponse::new(http_req, response).map_into_boxed_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_boxed_body())
        })
    }
}
