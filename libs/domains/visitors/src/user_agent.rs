use serde::{Deserialize, Serialize};
use woothee::parser::Parser;

/// Parsed `User-Agent` header, stored with each registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentInfo {
    pub ua: String,
    pub browser: String,
    pub browser_version: String,
    pub category: String,
    pub os: String,
    pub os_version: String,
    pub vendor: String,
}

impl UserAgentInfo {
    /// `None` for an empty header. Unknown agents still produce a record.
    pub fn parse(user_agent: &str) -> Option<Self> {
        let user_agent = user_agent.trim();
        if user_agent.is_empty() {
            return None;
        }

        let info = match Parser::new().parse(user_agent) {
            Some(result) => Self {
                ua: user_agent.to_string(),
                browser: result.name.to_string(),
                browser_version: result.version.to_string(),
                category: result.category.to_string(),
                os: result.os.to_string(),
                os_version: result.os_version.to_string(),
                vendor: result.vendor.to_string(),
            },
            None => Self {
                ua: user_agent.to_string(),
                browser: "UNKNOWN".to_string(),
                browser_version: "UNKNOWN".to_string(),
                category: "UNKNOWN".to_string(),
                os: "UNKNOWN".to_string(),
                os_version: "UNKNOWN".to_string(),
                vendor: "UNKNOWN".to_string(),
            },
        };
        Some(info)
    }

    pub fn from_header(user_agent: Option<&str>) -> Option<Self> {
        user_agent.and_then(Self::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_desktop_browser() {
        let info = UserAgentInfo::parse(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .unwrap();

        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.category, "pc");
        assert!(info.os.starts_with("Windows"));
    }

    #[test]
    fn test_empty_header_yields_none() {
        assert!(UserAgentInfo::parse("   ").is_none());
        assert!(UserAgentInfo::from_header(None).is_none());
    }

    #[test]
    fn test_garbage_is_kept_raw() {
        let info = UserAgentInfo::parse("curl-ish/0.0").unwrap();
        assert_eq!(info.ua, "curl-ish/0.0");
    }
}
