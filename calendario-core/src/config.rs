//! Client configuration at ~/.config/calendario/config.toml
//!
//! Every key can be overridden from the environment with a `CALENDARIO_`
//! prefix; nested keys use `__` (e.g. `CALENDARIO_EMAIL__API_KEY`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_DIR, DEFAULT_API_URL, DEFAULT_EMAIL_API_URL, DEFAULT_SENDER_NAME, ENV_PREFIX,
};
use crate::error::{CalendarioError, CalendarioResult};

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_email_api_url() -> String {
    DEFAULT_EMAIL_API_URL.to_string()
}

fn default_sender_name() -> String {
    DEFAULT_SENDER_NAME.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the calendario REST server.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub email: EmailConfig,
}

/// Transactional email settings. Nothing here has a usable default for
/// `api_key` or the sender addresses; they must come from the config file or
/// the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Sender address for verification codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_sender: Option<String>,

    /// Sender address for event invitations. Falls back to
    /// `verification_sender` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_sender: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: default_api_url(),
            request_timeout_secs: None,
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            api_key: None,
            api_url: default_email_api_url(),
            sender_name: default_sender_name(),
            verification_sender: None,
            invitation_sender: None,
        }
    }
}

impl EmailConfig {
    pub fn invitation_sender(&self) -> Option<&str> {
        self.invitation_sender
            .as_deref()
            .or(self.verification_sender.as_deref())
    }
}

impl ClientConfig {
    pub fn config_path() -> CalendarioResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalendarioError::Config("Could not determine config directory".into()))?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented default file on
    /// first run.
    pub fn load() -> CalendarioResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (optional) layered with `CALENDARIO_*` variables.
    pub fn load_from(path: &Path) -> CalendarioResult<Self> {
        let config: ClientConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CalendarioError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalendarioError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), api_url = %config.api_url, "loaded config");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalendarioResult<()> {
        let contents = format!(
            "\
# calendario configuration

# calendario server:
# api_url = \"{DEFAULT_API_URL}\"
# request_timeout_secs = 30

[email]
# Brevo API key (or set CALENDARIO_EMAIL__API_KEY):
# api_key = \"\"
# api_url = \"{DEFAULT_EMAIL_API_URL}\"
# sender_name = \"{DEFAULT_SENDER_NAME}\"
# verification_sender = \"no-reply@example.com\"
# invitation_sender = \"events@example.com\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalendarioError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalendarioError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
