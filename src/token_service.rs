use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Claims of a provider-issued session token; `sub` is the external identity id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("token has an empty subject")]
    EmptySubject,

    #[error("token issued for unauthorized party {0:?}")]
    UnauthorizedParty(Option<String>),
}

#[derive(Clone)]
pub struct TokenService {
    decoding_key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl TokenService {
    // RS256 verification with the provider's PEM public key
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self::with_key(DecodingKey::from_rsa_pem(pem)?, Algorithm::RS256))
    }

    // HS256 verification with a shared secret
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 5;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
            authorized_parties: Vec::new(),
        }
    }

    pub fn with_authorized_parties(mut self, parties: Vec<String>) -> Self {
        self.authorized_parties = parties;
        self
    }

    // Verification and decoding of a session token
    pub fn verify_jwt(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let claims = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.sub.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        if !self.authorized_parties.is_empty() {
            let allowed = claims
                .azp
                .as_ref()
                .is_some_and(|azp| self.authorized_parties.contains(azp));
            if !allowed {
                return Err(TokenError::UnauthorizedParty(claims.azp));
            }
        }

        Ok(claims)
    }
}
