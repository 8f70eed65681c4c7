/// Auth session persistence in chrome.storage.local
use crate::chrome;
use crate::config::SESSION_STORAGE_KEY;
use crate::error::Result;
use crate::protocol::{from_js, to_js};
use serde::{Deserialize, Serialize};

/// The signed-in backend user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by the auth endpoint, shared by every extension page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now_secs)
    }
}

#[allow(async_fn_in_trait)]
pub trait SessionStore {
    async fn load(&self) -> Result<Option<AuthSession>>;
    async fn save(&self, session: &AuthSession) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// SessionStore over chrome.storage.local
#[derive(Debug, Clone, Default)]
pub struct ChromeSessionStore;

impl SessionStore for ChromeSessionStore {
    async fn load(&self) -> Result<Option<AuthSession>> {
        let stored = chrome::storage_read(SESSION_STORAGE_KEY).await?;

        if stored.is_null() || stored.is_undefined() {
            Ok(None)
        } else {
            from_js(stored)
        }
    }

    async fn save(&self, session: &AuthSession) -> Result<()> {
        chrome::storage_write(SESSION_STORAGE_KEY, to_js(session)?).await
    }

    async fn clear(&self) -> Result<()> {
        chrome::storage_delete(SESSION_STORAGE_KEY).await
    }
}

/// In-memory SessionStore for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: std::cell::RefCell<Option<AuthSession>>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn with_session(session: AuthSession) -> MemorySessionStore {
        MemorySessionStore {
            session: std::cell::RefCell::new(Some(session)),
        }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<AuthSession>> {
        Ok(self.current())
    }

    async fn save(&self, session: &AuthSession) -> Result<()> {
        *self.session.borrow_mut() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.borrow_mut() = None;
        Ok(())
    }
}
