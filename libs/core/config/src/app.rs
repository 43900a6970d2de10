use crate::{ConfigError, FromEnv, env_bool_or_default, env_or_default};

/// Build-time application identity
#[derive(Clone, Debug)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Creates an [`AppInfo`] from the calling crate's package metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::app::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Public URLs that end up in emails and redirects
#[derive(Clone, Debug)]
pub struct LinksConfig {
    pub url_base: String,
}

impl LinksConfig {
    pub fn new(url_base: impl Into<String>) -> Self {
        Self {
            url_base: url_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{url_base}/service-link/confirm-email?token=...`
    pub fn email_confirm_link(&self, token: &str) -> String {
        format!("{}/service-link/confirm-email?token={}", self.url_base, token)
    }

    /// `{url_base}/service-link/reset-password?token=...`
    pub fn password_reset_link(&self, token: &str) -> String {
        format!("{}/service-link/reset-password?token={}", self.url_base, token)
    }
}

impl FromEnv for LinksConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(env_or_default(
            "URL_BASE_FOR_LINKS",
            "https://cloudtickets.io",
        )))
    }
}

/// Switches for local development
#[derive(Clone, Debug, Default)]
pub struct DebugConfig {
    pub skip_sending_user_registered_mail: bool,
}

impl FromEnv for DebugConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            skip_sending_user_registered_mail: env_bool_or_default(
                "SKIP_SEND_USER_REG_MAIL",
                false,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_default_base() {
        temp_env::with_var_unset("URL_BASE_FOR_LINKS", || {
            let links = LinksConfig::from_env().unwrap();
            assert_eq!(links.url_base, "https://cloudtickets.io");
            assert_eq!(
                links.email_confirm_link("abc"),
                "https://cloudtickets.io/service-link/confirm-email?token=abc"
            );
        });
    }

    #[test]
    fn test_links_trailing_slash_trimmed() {
        let links = LinksConfig::new("http://localhost:3000/");
        assert_eq!(
            links.password_reset_link("t1"),
            "http://localhost:3000/service-link/reset-password?token=t1"
        );
    }

    #[test]
    fn test_debug_config() {
        temp_env::with_var("SKIP_SEND_USER_REG_MAIL", Some("true"), || {
            assert!(DebugConfig::from_env().unwrap().skip_sending_user_registered_mail);
        });
    }

    #[test]
    fn test_app_info_macro() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
    }
}
