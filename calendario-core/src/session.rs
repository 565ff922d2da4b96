//! The signed-in user's identity and bearer token.
//!
//! `SessionStore` is a shared handle: every clone sees the same state, so the
//! HTTP client, the API facade and the CLI pages can all hold one without a
//! process-wide global. `SessionFile` persists a session between CLI runs:
//!   ~/.config/calendario/session.toml

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::constants::APP_DIR;
use crate::error::{CalendarioError, CalendarioResult};

/// Username and token of the current user. Both empty when signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
}

impl Session {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Session {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// An empty, signed-out store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_session(session: Session) -> Self {
        SessionStore {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_username(&self, username: impl Into<String>) {
        self.write().username = username.into();
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = token.into();
    }

    /// Reset both username and token to empty.
    pub fn clear_auth(&self) {
        *self.write() = Session::default();
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn username(&self) -> String {
        self.read().username.clone()
    }

    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }
}

/// On-disk copy of a session, written after sign-in and removed on sign-out.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn default_path() -> CalendarioResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalendarioError::Config("Could not determine config directory".into()))?;

        Ok(config_dir.join(APP_DIR).join("session.toml"))
    }

    pub fn default_location() -> CalendarioResult<Self> {
        Ok(SessionFile {
            path: Self::default_path()?,
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SessionFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, or `None` if nobody is signed in.
    pub fn load(&self) -> CalendarioResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let session: Session = toml::from_str(&contents).map_err(|e| {
            CalendarioError::Serialization(format!(
                "Failed to parse session from {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> CalendarioResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(session)
            .map_err(|e| CalendarioError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, contents)?;

        // Owner-only (0600): the file holds a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "saved session");
        Ok(())
    }

    /// Remove the saved session. Missing files are fine.
    pub fn delete(&self) -> CalendarioResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "deleted session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Build a store from the saved session, or an empty one.
    pub fn load_store(&self) -> CalendarioResult<SessionStore> {
        Ok(self
            .load()?
            .map(SessionStore::from_session)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_is_not_authenticated() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated());
        assert_eq!(store.username(), "");
        assert_eq!(store.token(), "");
    }

    #[test]
    fn set_token_authenticates() {
        let store = SessionStore::new();
        store.set_token("x");
        assert!(store.is_authenticated());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let store = SessionStore::new();
        store.set_username("alice");
        store.set_token("");
        assert!(!store.is_authenticated());
    }

    #[test]
    fn clear_auth_resets_both_fields() {
        let store = SessionStore::from_session(Session::new("alice", "tok"));
        store.clear_auth();
        assert_eq!(store.snapshot(), Session::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        other.set_username("bob");
        other.set_token("t");
        assert_eq!(store.username(), "bob");
        assert!(store.is_authenticated());
    }

    #[test]
    fn session_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::at(dir.path().join("nested").join("session.toml"));

        assert_eq!(file.load().unwrap(), None);

        let session = Session::new("alice", "secret");
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        let store = file.load_store().unwrap();
        assert_eq!(store.username(), "alice");
        assert!(store.is_authenticated());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::at(dir.path().join("session.toml"));
        file.save(&Session::new("a", "b")).unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::at(dir.path().join("session.toml"));
        file.save(&Session::new("a", "b")).unwrap();

        file.delete().unwrap();
        file.delete().unwrap();
        assert_eq!(file.load().unwrap(), None);
        assert!(!file.load_store().unwrap().is_authenticated());
    }
}
