//! In-memory driver sessions keyed by an opaque cookie token.

use busline_core::{DriverId, Session};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Start a session for `driver` and return its token.
    pub fn create(&self, driver: DriverId, now: DateTime<Utc>) -> (String, Session) {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = Session::new(driver, now, self.ttl);
        self.sessions.insert(token.clone(), session.clone());
        (token, session)
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.sessions.get(token).map(|entry| entry.value().clone())?;
        if session.is_expired(now) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
