//! Password hashing, cookie sessions and the [`CurrentUser`] extractor.

use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::debug;

pub const SESSION_COOKIE: &str = "scientia_sid";

/// Lowercase hex SHA-256 of the password.
pub fn hash_password(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Danger,
    Warning,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
struct Session {
    user: User,
    flashes: Mutex<Vec<Flash>>,
}

const MAX_SESSIONS: u64 = 10_000;

/// In-memory sessions keyed by an opaque token. A session that goes unused
/// for the idle period is evicted.
#[derive(Clone)]
pub struct SessionStore {
    inner: Cache<String, Arc<Session>>,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Starts a session for `user` and returns its token.
    pub async fn create(&self, user: User) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = Session {
            user,
            flashes: Mutex::new(Vec::new()),
        };
        self.inner.insert(token.clone(), Arc::new(session)).await;
        token
    }

    pub async fn user(&self, token: &str) -> Option<User> {
        self.inner
            .get(token)
            .await
            .map(|session| session.user.clone())
    }

    pub async fn remove(&self, token: &str) {
        self.inner.invalidate(token).await;
    }

    pub async fn push_flash(&self, token: &str, flash: Flash) {
        if let Some(session) = self.inner.get(token).await {
            session.flashes.lock().await.push(flash);
        }
    }

    pub async fn take_flashes(&self, token: &str) -> Vec<Flash> {
        match self.inner.get(token).await {
            Some(session) => std::mem::take(&mut *session.flashes.lock().await),
            None => Vec::new(),
        }
    }

    #[cfg(test)]
    async fn live_sessions(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Drops the session cookie from the browser.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// The logged-in user. Requests without a valid session are redirected to
/// the landing page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.user.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.user.role == crate::models::Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub async fn flash(&self, state: &AppState, kind: FlashKind, message: impl Into<String>) {
        state
            .sessions
            .push_flash(&self.token, Flash::new(kind, message))
            .await;
    }

    pub async fn take_flashes(&self, state: &AppState) -> Vec<Flash> {
        state.sessions.take_flashes(&self.token).await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = session_token(&jar) else {
            return Err(Redirect::to("/"));
        };
        match state.sessions.user(&token).await {
            Some(user) => Ok(Self { user, token }),
            None => {
                debug!(path = %parts.uri.path(), "stale session token");
                Err(Redirect::to("/"))
            }
        }
    }
}
