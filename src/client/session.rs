//! Admin login state kept in browser-local storage.
//!
//! This only decides whether the moderation page is shown. The server never
//! sees it; admin API calls are authorised by the `x-admin-token` header.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const SESSION_KEY: &str = "sitefy_admin_session";
pub const CREDENTIALS_KEY: &str = "sitefy_admin_credentials";
pub const API_TOKEN_KEY: &str = "sitefy_admin_api_token";
pub const LOGIN_PAGE: &str = "/admin-login.html";
pub const SESSION_WINDOW: Duration = Duration::hours(2);

const DEV_HOSTS: &[&str] = &["localhost", "127.0.0.1"];
const DEV_EMAIL: &str = "admin@sitefy.co";
const DEV_PASSWORD: &str = "admin123";

/// Browser `localStorage`, or anything that behaves like it.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Stored session record. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub email: String,
    pub role: String,
    pub login_time: i64,
    pub expires: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub location: &'static str,
}

impl Redirect {
    fn login() -> Self {
        Self {
            location: LOGIN_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Use admin@sitefy.co / admin123 (or seed creds via console).")]
    LocalCredentialsRejected,
    #[error("Paste ADMIN_DASHBOARD_TOKEN in Advanced options to login (required in production).")]
    TokenRequired,
}

pub struct AdminAuth<S> {
    storage: S,
    hostname: String,
}

impl<S: SessionStorage> AdminAuth<S> {
    pub fn new(storage: S, hostname: impl Into<String>) -> Self {
        Self {
            storage,
            hostname: hostname.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn session(&self) -> Option<AdminSession> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn is_authenticated(&mut self) -> bool {
        self.is_authenticated_at(OffsetDateTime::now_utc())
    }

    /// Expired or unreadable sessions are removed as a side effect.
    pub fn is_authenticated_at(&mut self, now: OffsetDateTime) -> bool {
        match self.session() {
            Some(session) if epoch_millis(now) <= session.expires => true,
            Some(_) => {
                self.logout();
                false
            }
            None => {
                self.storage.remove_item(SESSION_KEY);
                false
            }
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<AdminSession, LoginError> {
        self.login_at(email, password, OffsetDateTime::now_utc())
    }

    /// Accepts a credential match, or any non-empty stored API token.
    pub fn login_at(
        &mut self,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<AdminSession, LoginError> {
        let token = self
            .storage
            .get_item(API_TOKEN_KEY)
            .map(|token| token.trim().to_string())
            .unwrap_or_default();

        let credentials_match = self
            .credentials()
            .get(email)
            .map(|expected| expected == password)
            .unwrap_or(false);

        if !credentials_match && token.is_empty() {
            return Err(if self.is_local_host() {
                LoginError::LocalCredentialsRejected
            } else {
                LoginError::TokenRequired
            });
        }

        let login_time = epoch_millis(now);
        let session = AdminSession {
            email: email.to_string(),
            role: "admin".to_string(),
            login_time,
            expires: login_time + SESSION_WINDOW.whole_milliseconds() as i64,
        };
        self.write_session(&session);
        Ok(session)
    }

    pub fn logout(&mut self) -> Redirect {
        self.storage.remove_item(SESSION_KEY);
        Redirect::login()
    }

    pub fn extend_session(&mut self) {
        self.extend_session_at(OffsetDateTime::now_utc())
    }

    pub fn extend_session_at(&mut self, now: OffsetDateTime) {
        if let Some(mut session) = self.session() {
            session.expires = epoch_millis(now) + SESSION_WINDOW.whole_milliseconds() as i64;
            self.write_session(&session);
        }
    }

    pub fn require_auth(&mut self) -> Result<(), Redirect> {
        self.require_auth_at(OffsetDateTime::now_utc())
    }

    /// Gate for admin pages. Activity slides the expiry forward.
    pub fn require_auth_at(&mut self, now: OffsetDateTime) -> Result<(), Redirect> {
        if !self.is_authenticated_at(now) {
            return Err(Redirect::login());
        }
        self.extend_session_at(now);
        Ok(())
    }

    pub fn admin_email(&self) -> Option<String> {
        self.session().map(|session| session.email)
    }

    /// Seeded credentials win. Without them the development pair applies,
    /// and only on a local host.
    fn credentials(&self) -> HashMap<String, String> {
        let seeded: HashMap<String, String> = self
            .storage
            .get_item(CREDENTIALS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        if !seeded.is_empty() {
            return seeded;
        }
        if self.is_local_host() {
            return HashMap::from([(DEV_EMAIL.to_string(), DEV_PASSWORD.to_string())]);
        }
        HashMap::new()
    }

    fn is_local_host(&self) -> bool {
        DEV_HOSTS.iter().any(|host| self.hostname.contains(host))
    }

    fn write_session(&mut self, session: &AdminSession) {
        match serde_json::to_string(session) {
            Ok(raw) => self.storage.set_item(SESSION_KEY, raw),
            Err(err) => tracing::warn!(error = %err, "failed to encode admin session"),
        }
    }
}

fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
