//! Everything a page needs: config, the API facade, the email notifier and
//! the on-disk session.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use calendario_core::config::ClientConfig;
use calendario_core::email::EmailNotifier;
use calendario_core::{CalendarApi, SessionFile, SessionStore};

pub struct AppContext {
    pub api: CalendarApi,
    pub notifier: EmailNotifier,
    session_file: SessionFile,
    interactive: bool,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = ClientConfig::load().context("Failed to load configuration")?;
        let session_file = SessionFile::default_location()?;
        let session = session_file
            .load_store()
            .with_context(|| format!("Failed to read session from {}", session_file.path().display()))?;

        Self::new(&config, session_file, session, std::io::stdin().is_terminal())
    }

    pub fn new(
        config: &ClientConfig,
        session_file: SessionFile,
        session: SessionStore,
        interactive: bool,
    ) -> Result<Self> {
        Ok(AppContext {
            api: CalendarApi::from_config(config, session)?,
            notifier: EmailNotifier::from_config(&config.email),
            session_file,
            interactive,
        })
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Write the in-memory session to disk, or remove the file when signed out.
    pub fn persist_session(&self) -> Result<()> {
        let session = self.session().snapshot();

        if session.is_authenticated() {
            self.session_file.save(&session)?;
        } else {
            self.session_file.delete()?;
        }

        Ok(())
    }

    /// Name of the signed-in user, or an error pointing at `login`.
    pub fn require_username(&self) -> Result<String> {
        if !self.session().is_authenticated() {
            anyhow::bail!(
                "Not signed in.\n\n\
                Sign in with:\n  \
                calendario login"
            );
        }

        Ok(self.session().username())
    }
}
