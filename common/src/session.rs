//! Client-held session marker and the dashboard guard.
//!
//! The marker only remembers the bearer token handed out by `/login` and its
//! expiry. It is never trusted on its own: the backend validates the token on
//! every protected request and a rejected token ends the session here too.

use chrono::{DateTime, Duration, TimeZone, Utc};

pub const SESSION_COOKIE: &str = "wb_session";
pub const SESSION_TTL_DAYS: i64 = 7;

pub fn session_ttl() -> Duration {
    Duration::days(SESSION_TTL_DAYS)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SessionMarker {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionMarker {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Cookie value: `<token>.<expiry as unix seconds>`.
    pub fn to_cookie_value(&self) -> String {
        format!("{}.{}", self.token, self.expires_at.timestamp())
    }

    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let (token, expires) = value.trim().rsplit_once('.')?;
        if token.is_empty() {
            return None;
        }
        let expires_at = Utc.timestamp_opt(expires.parse().ok()?, 0).single()?;
        Some(Self::new(token, expires_at))
    }

    /// Finds the marker in a `document.cookie` style string.
    pub fn from_cookies(cookies: &str) -> Option<Self> {
        cookies
            .split(';')
            .filter_map(|c| c.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Self::from_cookie_value(value))
    }

    /// `Set-Cookie` style assignment that lets the browser drop the marker at expiry.
    pub fn to_cookie(&self, now: DateTime<Utc>) -> String {
        let max_age = (self.expires_at - now).num_seconds().max(0);
        format!(
            "{SESSION_COOKIE}={}; path=/; max-age={max_age}; SameSite=Strict",
            self.to_cookie_value()
        )
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Assignment that removes the marker.
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; path=/; max-age=0")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(SessionMarker),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn marker(&self) -> Option<&SessionMarker> {
        match self {
            SessionState::Authenticated(marker) => Some(marker),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Admits a present and unexpired marker. Expiry is detected passively here,
/// on the next check.
pub fn guard(marker: Option<SessionMarker>, now: DateTime<Utc>) -> SessionState {
    match marker {
        Some(marker) if !marker.is_expired(now) => SessionState::Authenticated(marker),
        _ => SessionState::Unauthenticated,
    }
}
