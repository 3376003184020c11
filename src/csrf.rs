use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::session::{Session, SessionStore};

/// Request header carrying the anti-forgery token on state-changing requests.
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Per-session anti-forgery secret, 256 bits from the OS random source.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfSecret([u8; 32]);

impl CsrfSecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// Secret material must not end up in logs or error bodies.
impl fmt::Debug for CsrfSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfSecret(..)")
    }
}

/// Token derivation: HMAC-SHA256 over the session id, keyed by the session
/// secret, hex encoded. The token is safe to hand to the client; the secret
/// itself never leaves the server.
pub fn derive_token(secret: &CsrfSecret, session_id: Uuid) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(session_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Only state-changing methods are subject to CSRF validation.
pub fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Issues and validates per-session anti-forgery tokens.
///
/// Tokens are not single-use: one token is valid for the whole session
/// lifetime, and validation performs no mutation.
#[derive(Debug, Clone)]
pub struct CsrfTokenService {
    sessions: Arc<SessionStore>,
}

impl CsrfTokenService {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Bind a secret to the session if none is bound yet, and return the
    /// derived token. Idempotent: re-issuing on a session that already has
    /// a secret returns the same token.
    pub fn issue(&self, session_id: Uuid) -> AppResult<String> {
        let secret = self.sessions.bind_csrf_secret(session_id)?;
        Ok(derive_token(&secret, session_id))
    }

    /// Validate a supplied token against the session's bound secret.
    pub fn validate(&self, session: &Session, supplied: Option<&str>) -> AppResult<()> {
        let supplied = supplied.ok_or(AppError::CsrfMissing)?;

        if session.is_expired(Utc::now()) {
            return Err(AppError::CsrfSessionExpired);
        }

        // A session that never issued a token has nothing to match against.
        let secret = session.csrf_secret().ok_or(AppError::CsrfMismatch)?;
        let expected = derive_token(secret, session.id);

        // Constant-time comparison; hex tokens have a fixed length, so a
        // length difference is itself a mismatch.
        let matches = expected.as_bytes().ct_eq(supplied.as_bytes());
        if matches.into() {
            Ok(())
        } else {
            Err(AppError::CsrfMismatch)
        }
    }
}
