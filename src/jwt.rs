use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppError;

/// Bearer-token configuration. This layer is the external authentication
/// collaborator: it mints and decodes the `(principal id, roles,
/// superuser)` tuple, and nothing downstream touches credentials.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
            exp_hours,
        })
    }

    pub fn encode(&self, principal: &Principal) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let claims = Claims {
            sub: principal.id,
            roles: principal.roles.iter().cloned().collect(),
            superuser: principal.superuser,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub superuser: bool,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn into_principal(self) -> Principal {
        Principal::new(self.sub)
            .with_roles(self.roles)
            .with_superuser(self.superuser)
    }
}

/// Extractor resolving the request's principal from the Authorization
/// header. Handlers that only need authentication (not a capability) take
/// this directly.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // The capability guard may already have resolved the principal.
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(AuthPrincipal(principal.clone()));
        }

        let claims = decode_bearer(&parts.headers, &state.jwt)?;
        Ok(AuthPrincipal(claims.into_principal()))
    }
}

pub fn decode_bearer(
    headers: &axum::http::HeaderMap,
    jwt: &JwtConfig,
) -> Result<Claims, AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

    jwt.decode(token)
}
