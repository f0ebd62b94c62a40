//! Credential store and legacy-key migration.

use std::path::Path;

use crate::storage::{FileStorage, MemoryStorage, StorageBackend};

/// Canonical session-scoped keys.
pub const ACCESS_KEY: &str = "access";
pub const REFRESH_KEY: &str = "refresh";
/// The one key allowed to outlive the session.
pub const THEME_KEY: &str = "theme";

/// Key names older releases wrote to persistent storage.
const LEGACY_ACCESS_KEYS: [&str; 2] = ["access", "access_token"];
const LEGACY_REFRESH_KEYS: [&str; 2] = ["refresh", "refresh_token"];

/// Single source of truth for the two tokens.
///
/// Tokens live in the session-scoped backend so they do not outlive the
/// process; the persistent backend holds only the `theme` preference once
/// [`CredentialStore::migrate_legacy`] has run.
pub struct CredentialStore {
    session: Box<dyn StorageBackend>,
    persistent: Box<dyn StorageBackend>,
}

impl CredentialStore {
    pub fn new(session: Box<dyn StorageBackend>, persistent: Box<dyn StorageBackend>) -> Self {
        Self {
            session,
            persistent,
        }
    }

    /// Store with the default backends: in-memory session storage and a
    /// JSON file at `path` for the persistent side.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(
            Box::new(MemoryStorage::new()),
            Box::new(FileStorage::open(path)),
        )
    }

    /// One-time startup migration.
    ///
    /// Tokens written to persistent storage by older releases (under any
    /// of the legacy key names) are copied to the canonical session-scoped
    /// keys, then every persistent key except `theme` is cleared. The
    /// theme value is read before the clear and re-written after it.
    /// Idempotent: with no legacy keys present the store is unchanged.
    pub fn migrate_legacy(&self) {
        let access = LEGACY_ACCESS_KEYS
            .iter()
            .find_map(|key| self.persistent.get(key));
        let refresh = LEGACY_REFRESH_KEYS
            .iter()
            .find_map(|key| self.persistent.get(key));

        if let Some(ref access) = access {
            self.session.set(ACCESS_KEY, access);
        }
        if let Some(ref refresh) = refresh {
            self.session.set(REFRESH_KEY, refresh);
        }
        if access.is_some() || refresh.is_some() {
            tracing::info!("Migrated legacy credentials to session storage");
        }

        let theme = self.persistent.get(THEME_KEY);
        for key in self.persistent.keys() {
            self.persistent.remove(&key);
        }
        if let Some(ref theme) = theme {
            self.persistent.set(THEME_KEY, theme);
        }
    }

    pub fn access(&self) -> Option<String> {
        self.session.get(ACCESS_KEY)
    }

    pub fn refresh(&self) -> Option<String> {
        self.session.get(REFRESH_KEY)
    }

    pub fn set_access(&self, token: &str) {
        self.session.set(ACCESS_KEY, token);
    }

    pub fn set_tokens(&self, access: &str, refresh: &str) {
        self.session.set(ACCESS_KEY, access);
        self.session.set(REFRESH_KEY, refresh);
    }

    pub fn clear_tokens(&self) {
        self.session.remove(ACCESS_KEY);
        self.session.remove(REFRESH_KEY);
    }

    pub fn theme(&self) -> Option<String> {
        self.persistent.get(THEME_KEY)
    }

    pub fn set_theme(&self, theme: &str) {
        self.persistent.set(THEME_KEY, theme);
    }

    /// Persistent keys, exposed for tests and diagnostics.
    pub fn persistent_keys(&self) -> Vec<String> {
        self.persistent.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
        )
    }

    fn store_with_persistent(entries: &[(&str, &str)]) -> CredentialStore {
        let persistent = MemoryStorage::new();
        for (key, value) in entries {
            persistent.set(key, value);
        }
        CredentialStore::new(Box::new(MemoryStorage::new()), Box::new(persistent))
    }

    #[test]
    fn test_migration_moves_canonical_legacy_keys() {
        let store = store_with_persistent(&[("access", "a1"), ("refresh", "r1")]);
        store.migrate_legacy();

        assert_eq!(store.access().as_deref(), Some("a1"));
        assert_eq!(store.refresh().as_deref(), Some("r1"));
        assert!(store.persistent_keys().is_empty());
    }

    #[test]
    fn test_migration_moves_suffixed_legacy_keys() {
        let store = store_with_persistent(&[("access_token", "a1"), ("refresh_token", "r1")]);
        store.migrate_legacy();

        assert_eq!(store.access().as_deref(), Some("a1"));
        assert_eq!(store.refresh().as_deref(), Some("r1"));
    }

    #[test]
    fn test_migration_preserves_theme() {
        let store = store_with_persistent(&[("access", "a1"), ("theme", "dark"), ("junk", "x")]);
        store.migrate_legacy();

        assert_eq!(store.theme().as_deref(), Some("dark"));
        assert_eq!(store.persistent_keys(), vec!["theme".to_string()]);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let store = store_with_persistent(&[("access", "a1"), ("theme", "dark")]);
        store.migrate_legacy();
        store.migrate_legacy();

        assert_eq!(store.access().as_deref(), Some("a1"));
        assert_eq!(store.theme().as_deref(), Some("dark"));
        assert_eq!(store.persistent_keys(), vec!["theme".to_string()]);
    }

    #[test]
    fn test_migration_without_legacy_keys_is_noop() {
        let store = store_with_persistent(&[("theme", "light")]);
        store.migrate_legacy();

        assert!(store.access().is_none());
        assert!(store.refresh().is_none());
        assert_eq!(store.theme().as_deref(), Some("light"));
    }

    #[test]
    fn test_clear_tokens_leaves_theme() {
        let store = store();
        store.set_theme("dark");
        store.set_tokens("a1", "r1");

        store.clear_tokens();

        assert!(store.access().is_none());
        assert!(store.refresh().is_none());
        assert_eq!(store.theme().as_deref(), Some("dark"));
    }

    #[test]
    fn test_set_access_overwrites_only_access() {
        let store = store();
        store.set_tokens("a1", "r1");
        store.set_access("a2");

        assert_eq!(store.access().as_deref(), Some("a2"));
        assert_eq!(store.refresh().as_deref(), Some("r1"));
    }
}
