//! Session lifecycle management.
//!
//! The [`SessionManager`] is the only component that mutates session
//! state. Consumers observe it through a watch channel of
//! [`SessionSnapshot`] values; every transition publishes a fresh
//! snapshot.

use std::sync::Arc;

use tokio::sync::watch;

use dormlink_common::UserProfile;

use crate::api::ApiClient;
use crate::auth::claims::{AccessClaims, ClaimsDecoder, UnverifiedDecoder};
use crate::auth::credentials::CredentialStore;
use crate::error::Result;

/// Point-in-time view of the session.
///
/// `is_loading` is true only between construction and the end of
/// [`SessionManager::initialize`]. Tokens are not part of the snapshot;
/// they live in the credential store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl SessionSnapshot {
    fn bootstrapping() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }
}

/// Orchestrates the credential store, claims decoder and profile fetch
/// into the session lifecycle: `initialize`, `login`, `logout` and the
/// profile setters.
pub struct SessionManager {
    credentials: Arc<CredentialStore>,
    api: Arc<ApiClient>,
    decoder: Box<dyn ClaimsDecoder>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    pub fn new(credentials: Arc<CredentialStore>, api: Arc<ApiClient>) -> Self {
        Self::with_decoder(credentials, api, Box::new(UnverifiedDecoder::new()))
    }

    /// Construct with a custom claims decoder (e.g. a signature-verifying
    /// one).
    pub fn with_decoder(
        credentials: Arc<CredentialStore>,
        api: Arc<ApiClient>,
        decoder: Box<dyn ClaimsDecoder>,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::bootstrapping());
        Self {
            credentials,
            api,
            decoder,
            state,
        }
    }

    /// Bootstrap the session from stored credentials. Runs once at startup.
    ///
    /// Never fails: a missing token or an undecodable one resolves into an
    /// unauthenticated session, and an unreachable profile endpoint falls
    /// back to claims-derived identity. Always ends with
    /// `is_loading = false`.
    pub async fn initialize(&self) {
        self.credentials.migrate_legacy();

        let Some(access) = self.credentials.access() else {
            self.publish(None, false);
            return;
        };

        let claims = match self.decoder.decode(&access) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Stored access token is unusable, clearing session: {}", e);
                self.credentials.clear_tokens();
                self.publish(None, false);
                return;
            }
        };

        let user = self.resolve_profile(&access, claims).await;
        tracing::info!(user_id = user.id, "Session restored");
        self.publish(Some(user), true);
    }

    /// Establish a session from a freshly issued token pair.
    ///
    /// Callers must await this before acting on `is_authenticated`. Only a
    /// decode failure prevents authentication; a failed profile fetch
    /// degrades to claims-derived identity.
    pub async fn login(&self, access: &str, refresh: &str) -> Result<()> {
        self.credentials.set_tokens(access, refresh);

        let claims = match self.decoder.decode(access) {
            Ok(claims) => claims,
            Err(e) => {
                self.credentials.clear_tokens();
                self.publish(None, false);
                return Err(e);
            }
        };

        let user = self.resolve_profile(access, claims).await;
        tracing::info!(user_id = user.id, "Logged in");
        self.publish(Some(user), true);
        Ok(())
    }

    /// Drop the session. No network traffic; the refresh token is simply
    /// discarded.
    pub fn logout(&self) {
        self.credentials.clear_tokens();
        self.publish(None, false);
        tracing::info!("Logged out");
    }

    /// Raw overwrite of the user, leaving the authentication flags alone.
    pub fn set_user(&self, user: Option<UserProfile>) {
        self.state.send_modify(|snapshot| snapshot.user = user);
    }

    /// Overwrite the profile after an external edit. Tokens are untouched.
    pub fn update_user_profile(&self, profile: UserProfile) {
        self.set_user(Some(profile));
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Watch receiver that yields a value on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Hydrate the profile from the server, falling back to the decoded
    /// claims. The id always comes from the token claim, so the identity
    /// never drifts from the token that grants it.
    async fn resolve_profile(&self, access: &str, claims: AccessClaims) -> UserProfile {
        match self.api.fetch_profile(access).await {
            Ok(mut profile) => {
                profile.id = claims.user_id;
                profile
            }
            Err(e) => {
                tracing::warn!("Profile fetch failed, using token claims: {}", e);
                claims.into_profile()
            }
        }
    }

    fn publish(&self, user: Option<UserProfile>, is_authenticated: bool) {
        self.state.send_replace(SessionSnapshot {
            user,
            is_authenticated,
            is_loading: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::storage::MemoryStorage;

    fn manager() -> SessionManager {
        let credentials = Arc::new(CredentialStore::new(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
        ));
        let api = Arc::new(ApiClient::new(&ApiConfig::default(), credentials.clone()).unwrap());
        SessionManager::new(credentials, api)
    }

    #[test]
    fn test_initial_snapshot_is_loading() {
        let session = manager();
        let snapshot = session.snapshot();
        assert!(snapshot.is_loading);
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.user.is_none());
    }

    #[test]
    fn test_logout_publishes_unauthenticated() {
        let session = manager();
        session.logout();

        let snapshot = session.snapshot();
        assert!(!snapshot.is_loading);
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.user.is_none());
    }

    #[test]
    fn test_set_user_keeps_flags() {
        let session = manager();
        session.logout();
        session.set_user(Some(UserProfile {
            id: 3,
            username: "jdoe".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            image: None,
        }));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.user.unwrap().id, 3);
        assert!(!snapshot.is_authenticated);
    }
}
