use http::HeaderMap;
use http::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Account role. Handlers compare against it through the guards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// Authenticated caller, as resolved by the transport from its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

/// Where a dispatched request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RequestSource {
    Http,
    Ws,
    Other,
}

/// Transport metadata a handler may look at (headers only).
#[derive(Debug, Clone, Default)]
pub struct TransportHandle {
    headers: HeaderMap,
}

impl TransportHandle {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
    }
}

/// Per-call context, built by the dispatcher and handed to exactly one handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub cid: String,
    pub source: RequestSource,
    pub user: Option<CallerIdentity>,
    pub remote_address: Option<String>,
    pub transport: Option<TransportHandle>,
}

impl RequestContext {
    pub fn new(cid: impl Into<String>, source: RequestSource) -> Self {
        Self {
            cid: cid.into(),
            source,
            user: None,
            remote_address: None,
            transport: None,
        }
    }

    pub fn with_user(mut self, user: Option<CallerIdentity>) -> Self {
        self.user = user;
        self
    }

    pub fn with_remote_address(mut self, remote_address: Option<String>) -> Self {
        self.remote_address = remote_address;
        self
    }

    pub fn with_transport(mut self, transport: Option<TransportHandle>) -> Self {
        self.transport = transport;
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.transport.as_ref().and_then(TransportHandle::user_agent)
    }

    /// Human-readable caller description, e.g. `admin:a@b.co@10.0.0.1` or `anonymous`.
    pub fn actor(&self) -> String {
        let who = match &self.user {
            Some(user) => format!("{}:{}", user.role, user.email),
            None => "anonymous".to_string(),
        };

        match &self.remote_address {
            Some(addr) => format!("{}@{}", who, addr),
            None => who,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_actor_description() {
        let ctx = RequestContext::new("cid", RequestSource::Http);
        assert_eq!(ctx.actor(), "anonymous");

        let ctx = ctx
            .with_user(Some(CallerIdentity {
                id: "u1".into(),
                email: "a@b.co".into(),
                role: UserRole::Admin,
            }))
            .with_remote_address(Some("10.0.0.1".into()));
        assert_eq!(ctx.actor(), "admin:a@b.co@10.0.0.1");
    }

    #[test]
    fn test_user_agent_from_transport() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let ctx = RequestContext::new("cid", RequestSource::Http)
            .with_transport(Some(TransportHandle::new(headers)));
        assert_eq!(ctx.user_agent(), Some("curl/8.0"));
        assert_eq!(RequestContext::new("c", RequestSource::Ws).user_agent(), None);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("root".parse::<UserRole>().is_err());
    }
}
