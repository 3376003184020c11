use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::csrf::CsrfSecret;
use crate::errors::{AppError, AppResult};

/// A server-side session: identifier, lifetime window, and at most one
/// bound CSRF secret. The secret never changes once bound.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    csrf_secret: Option<CsrfSecret>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn csrf_secret(&self) -> Option<&CsrfSecret> {
        self.csrf_secret.as_ref()
    }
}

/// In-memory session store. Stands in for the hosting framework's session
/// backend; the pipeline only needs resolve/create/bind.
#[derive(Debug)]
pub struct SessionStore {
    max_age: Duration,
    inner: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new(max_age_secs: i64) -> Self {
        Self {
            max_age: Duration::seconds(max_age_secs),
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + self.max_age,
            csrf_secret: None,
        };

        let mut inner = self.inner.write().expect("session store lock poisoned");
        inner.insert(session.id, session.clone());
        tracing::debug!(session = %session.id, "created session");
        session
    }

    /// Snapshot of the session, if it exists.
    pub fn get(&self, id: Uuid) -> Option<Session> {
        let inner = self.inner.read().expect("session store lock poisoned");
        inner.get(&id).cloned()
    }

    /// Bind a freshly generated CSRF secret to the session, at most once.
    /// Re-invoking returns the already-bound secret unchanged.
    pub fn bind_csrf_secret(&self, id: Uuid) -> AppResult<CsrfSecret> {
        let mut inner = self.inner.write().expect("session store lock poisoned");
        let session = inner
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("session not found"))?;

        if let Some(secret) = &session.csrf_secret {
            return Ok(secret.clone());
        }

        let secret = CsrfSecret::generate();
        session.csrf_secret = Some(secret.clone());
        tracing::debug!(session = %id, "bound csrf secret");
        Ok(secret)
    }
}
