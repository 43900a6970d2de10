use crate::{
    ConfigError, Environment, FromEnv, env_bool_or_default, env_parse_or_default, env_required,
};
use std::time::Duration;

const DEV_SECRET: &str = "tickets-development-session-secret-change-me";
const DEFAULT_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Signed session cookie settings
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl: Duration,
    pub cookie_name: String,
    pub secure_cookies: bool,
}

impl FromEnv for SessionConfig {
    /// `SESSION_SECRET` is mandatory in production.
    fn from_env() -> Result<Self, ConfigError> {
        let secret = match env_required("SESSION_SECRET") {
            Ok(secret) => secret,
            Err(e) if Environment::from_env().is_production() => return Err(e),
            Err(_) => DEV_SECRET.to_string(),
        };

        Ok(Self {
            secret,
            ttl: Duration::from_secs(env_parse_or_default("SESSION_TTL_SECS", DEFAULT_TTL_SECS)?),
            cookie_name: "tickets.sid".to_string(),
            secure_cookies: env_bool_or_default("SECURE_COOKIES", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_secret_defaults_in_development() {
        temp_env::with_vars(
            [("APP_ENV", None::<&str>), ("SESSION_SECRET", None)],
            || {
                let config = SessionConfig::from_env().unwrap();
                assert_eq!(config.secret, DEV_SECRET);
                assert_eq!(config.ttl, Duration::from_secs(DEFAULT_TTL_SECS));
                assert!(config.secure_cookies);
            },
        );
    }

    #[test]
    fn test_session_secret_required_in_production() {
        temp_env::with_vars(
            [("APP_ENV", Some("production")), ("SESSION_SECRET", None)],
            || {
                let err = SessionConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("SESSION_SECRET"));
            },
        );
    }
}
