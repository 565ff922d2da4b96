/// Base URL of the calendario REST server when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8081";

/// Base URL of the Brevo transactional email API.
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.brevo.com/v3";

pub const DEFAULT_SENDER_NAME: &str = "Tu Calendario";

/// Name of the directory under the platform config dir.
pub const APP_DIR: &str = "calendario";

/// Prefix for environment overrides, e.g. `CALENDARIO_API_URL`.
pub const ENV_PREFIX: &str = "CALENDARIO";

/// Minutes a verification code stays valid. Only shown to the user; the
/// server owns expiry.
pub const VERIFICATION_CODE_TTL_MINUTES: u32 = 10;
