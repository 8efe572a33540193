//! Server configuration, read from the environment (and `.env`) at startup.

use log::warn;

use crate::token_service::TokenService;

pub const DEFAULT_IDENTITY_API_URL: &str = "https://api.clerk.com/v1";
const DEV_JWT_SECRET: &str = "dev-identity-secret-change-this-in-production";

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub api_url: String,
    pub secret_key: Option<String>,
    pub jwt_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub authorized_parties: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Unset means the in-memory store is used.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub identity: IdentityConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty("PORT").and_then(|v| v.parse().ok()).unwrap_or(3000),
            database_url: non_empty("DATABASE_URL"),
            max_connections: non_empty("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            identity: IdentityConfig {
                api_url: non_empty("IDENTITY_API_URL")
                    .unwrap_or_else(|| DEFAULT_IDENTITY_API_URL.to_string()),
                secret_key: non_empty("IDENTITY_SECRET_KEY"),
                jwt_key: non_empty("IDENTITY_JWT_KEY"),
                jwt_secret: non_empty("IDENTITY_JWT_SECRET"),
                authorized_parties: non_empty("IDENTITY_AUTHORIZED_PARTIES")
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|party| !party.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    // PEM key (RS256) wins over the shared secret (HS256)
    pub fn token_service(&self) -> Result<TokenService, jsonwebtoken::errors::Error> {
        let identity = &self.identity;

        let service = match (&identity.jwt_key, &identity.jwt_secret) {
            (Some(pem), _) => TokenService::from_rsa_pem(pem.replace("\\n", "\n").as_bytes())?,
            (None, Some(secret)) => TokenService::from_secret(secret.as_bytes()),
            (None, None) => {
                warn!("Using default IDENTITY_JWT_SECRET. Set IDENTITY_JWT_KEY or IDENTITY_JWT_SECRET for production!");
                TokenService::from_secret(DEV_JWT_SECRET.as_bytes())
            }
        };

        Ok(service.with_authorized_parties(identity.authorized_parties.clone()))
    }
}
