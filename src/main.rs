use std::sync::Arc;

use actix_web::{middleware as actix_middleware, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use chat_backend::config::Config;
use chat_backend::database;
use chat_backend::handlers::configure_routes;
use chat_backend::identity::ClerkClient;
use chat_backend::state::AppState;
use chat_backend::store::{MemoryStore, PgStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Environment variables, then logging
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();

    let token_service = config
        .token_service()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid IDENTITY_JWT_KEY: {}", e)))?;

    if config.identity.secret_key.is_none() {
        warn!("IDENTITY_SECRET_KEY is not set; first-time sign-ins cannot fetch provider profiles");
    }
    let identity = Arc::new(ClerkClient::new(
        config.identity.api_url.clone(),
        config.identity.secret_key.clone(),
    ));

    let state = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to the database...");
            let pool = database::create_pool(database_url, config.max_connections)
                .await
                .map_err(std::io::Error::other)?;
            database::run_migrations(&pool)
                .await
                .map_err(std::io::Error::other)?;
            info!("Database connection established");

            AppState::new(Arc::new(PgStore::new(pool)), identity, token_service)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store, data is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), identity, token_service)
        }
    };

    let bind_address = config.bind_address();
    info!("chat backend listening on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .configure(|cfg| state.configure(cfg))
            .wrap(state.identity_middleware())
            .wrap(actix_middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
