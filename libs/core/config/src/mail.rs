use crate::{ConfigError, FromEnv, env_bool_or_default, env_or_default, env_parse_or_default};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_FROM: &str = "no-reply@cloudtickets.io";
pub const DEFAULT_FROM_NAME: &str = "Awesome Service";

/// SMTP connection parameters
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (SMTPS). When false a plain connection is used.
    pub secure: bool,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("SMTP_HOST", "invalid_smtp_host"),
            port: env_parse_or_default("SMTP_PORT", 465)?,
            secure: env_bool_or_default("SMTP_SECURE", true)?,
            username: env_or_default("SMTP_USER", ""),
            password: env_or_default("SMTP_PASSWORD", ""),
        })
    }
}

/// Outgoing mail settings
#[derive(Clone, Debug)]
pub struct MailConfig {
    /// Idle time between two drains of the outbox
    pub poll_interval: Duration,
    pub default_from: String,
    pub default_from_name: String,
    pub smtp: SmtpConfig,
}

impl FromEnv for MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            poll_interval: Duration::from_millis(env_parse_or_default(
                "MAIL_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            default_from: env_or_default("MAIL_DEFAULT_FROM", DEFAULT_FROM),
            default_from_name: env_or_default("MAIL_DEFAULT_FROM_NAME", DEFAULT_FROM_NAME),
            smtp: SmtpConfig::from_env()?,
        })
    }
}
