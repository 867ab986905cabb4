//! Application state: credentials, positions and sessions behind one handle.

use std::sync::Arc;

use busline_core::{DriverId, PositionRecord, Session, TrackerError};
use chrono::{DateTime, Local, Utc};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::persistence::locations::LocationSnapshot;
use crate::persistence::{CredentialStore, LocationRegistry};
use crate::state::SessionStore;

/// Application state shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    config: Config,
    credentials: Arc<CredentialStore>,
    locations: LocationRegistry,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, credentials: CredentialStore, locations: LocationRegistry) -> Self {
        let sessions = SessionStore::new(config.session_ttl());
        Self {
            config,
            credentials: Arc::new(credentials),
            locations,
            sessions,
        }
    }

    /// Load both stores from the paths in `config`.
    pub async fn initialize(config: Config) -> Result<Self, TrackerError> {
        let credentials = CredentialStore::initialize(config.drivers_path()).await?;
        let locations = LocationRegistry::initialize(config.locations_path()).await?;
        Ok(Self::new(config, credentials, locations))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    /// Check a username/password pair and open a session on success.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Option<(String, Session)> {
        let credentials = Arc::clone(&self.credentials);
        let (user, secret) = (username.to_string(), password.to_string());
        let verified = match tokio::task::spawn_blocking(move || credentials.verify(&user, &secret)).await {
            Ok(verified) => verified,
            Err(err) => {
                error!("Credential check for {} aborted: {}", username, err);
                false
            }
        };

        if !verified {
            info!("Rejected login for {:?}", username);
            return None;
        }

        let purged = self.sessions.purge_expired(now);
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }

        let (token, session) = self.sessions.create(DriverId::from(username), now);
        info!("Driver {} logged in", session.driver);
        Some((token, session))
    }

    pub fn logout(&self, token: &str) {
        if let Some(session) = self.sessions.revoke(token) {
            info!("Driver {} logged out", session.driver);
        }
    }

    /// Resolve a session cookie value into a live session.
    pub fn authenticate(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<Session, TrackerError> {
        token
            .and_then(|token| self.sessions.resolve(token, now))
            .ok_or(TrackerError::Unauthenticated)
    }

    /// Record the session driver's current position.
    pub async fn report_location(
        &self,
        session: &Session,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        now: DateTime<Local>,
    ) -> Result<PositionRecord, TrackerError> {
        if session.is_expired(now.with_timezone(&Utc)) {
            return Err(TrackerError::Unauthenticated);
        }
        self.locations
            .upsert(&session.driver, latitude, longitude, accuracy, now)
            .await
    }

    /// The session driver's own last position.
    pub async fn own_location(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<PositionRecord, TrackerError> {
        if session.is_expired(now) {
            return Err(TrackerError::Unauthenticated);
        }
        self.locations.get_one(session.driver.as_str()).await
    }

    /// Every driver's last position; no session needed.
    pub async fn all_locations(&self) -> Result<LocationSnapshot, TrackerError> {
        self.locations.get_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn scratch_state() -> (AppState, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("busline-state-{}", uuid::Uuid::new_v4()));
        let mut config = Config::from_env();
        config.data_dir = dir.clone();
        config.locations_file = "locations.json".to_string();
        config.drivers_file = "drivers.json".to_string();
        config.session_ttl_secs = 60;
        (AppState::initialize(config).await.unwrap(), dir)
    }

    #[tokio::test]
    async fn login_opens_session_for_valid_credentials() {
        let (state, dir) = scratch_state().await;
        let now = Utc::now();

        let (token, session) = state.login("driver1", "pass123", now).await.unwrap();
        assert_eq!(session.driver.as_str(), "driver1");
        assert_eq!(state.authenticate(Some(token.as_str()), now).unwrap(), session);

        assert!(state.login("driver1", "wrong", now).await.is_none());
        assert!(state.login("stranger", "pass123", now).await.is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_unauthenticated() {
        let (state, dir) = scratch_state().await;
        let now = Utc::now();

        assert!(matches!(
            state.authenticate(None, now),
            Err(TrackerError::Unauthenticated)
        ));
        assert!(matches!(
            state.authenticate(Some("forged"), now),
            Err(TrackerError::Unauthenticated)
        ));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn expired_session_cannot_report() {
        let (state, dir) = scratch_state().await;
        let stale = Session::new(
            DriverId::from("driver1"),
            Utc::now() - Duration::hours(2),
            Duration::hours(1),
        );

        let err = state
            .report_location(&stale, 1.0, 2.0, 0.0, Local::now())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Unauthenticated));
        assert!(matches!(state.all_locations().await, Err(TrackerError::Empty)));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn report_then_read_own_location() {
        let (state, dir) = scratch_state().await;
        let (_, session) = state.login("driver2", "pass456", Utc::now()).await.unwrap();

        let record = state
            .report_location(&session, 15.3173, 75.7139, 12.5, Local::now())
            .await
            .unwrap();
        let own = state.own_location(&session, Utc::now()).await.unwrap();
        assert_eq!(own, record);
        assert_eq!(own.owner.as_str(), "driver2");

        let all = state.all_locations().await.unwrap();
        assert_eq!(all.len(), 1);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn logout_revokes_session() {
        let (state, dir) = scratch_state().await;
        let now = Utc::now();
        let (token, _) = state.login("admin", "admin123", now).await.unwrap();

        state.logout(&token);
        assert!(state.authenticate(Some(token.as_str()), now).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }
}
