use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};
use validator::{Validate, ValidateEmail, ValidationError};

use crate::user_agent::UserAgentInfo;

/// Where a registration belongs. Fingerprints are unique per scope only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisitorScope {
    Event(String),
    FastTrack,
}

impl VisitorScope {
    pub fn key(&self) -> String {
        match self {
            VisitorScope::Event(event_id) => format!("event:{}", event_id),
            VisitorScope::FastTrack => "fast-track".to_string(),
        }
    }

    /// Fast-track forms never collect birthday or gender.
    pub fn hashes_optional_fields(&self) -> bool {
        matches!(self, VisitorScope::Event(_))
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            VisitorScope::Event(event_id) => Some(event_id),
            VisitorScope::FastTrack => None,
        }
    }
}

impl fmt::Display for VisitorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SourceType {
    FastTrack,
    Widget,
    External,
}

/// What a visitor typed into the registration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VisitorFields {
    #[validate(length(min = 1, max = 200))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub middle_name: String,
    #[validate(length(min = 1, max = 200))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub company_name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub position: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub phone: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_birthday"))]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

fn validate_optional_email(email: &String) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("must be a valid email".into()))
    }
}

fn validate_birthday(birthday: &String) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(birthday, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("birthday").with_message("expected YYYY-MM-DD".into()))
}

/// One registration attempt.
#[derive(Debug, Clone)]
pub struct VisitorRegistration {
    pub scope: VisitorScope,
    pub fields: VisitorFields,
    pub source_type: Option<SourceType>,
    pub source_data: Option<serde_json::Value>,
    pub ua_info: Option<UserAgentInfo>,
    pub remote_address: Option<String>,
}

impl VisitorRegistration {
    pub fn new(scope: VisitorScope, fields: VisitorFields) -> Self {
        Self {
            scope,
            fields,
            source_type: None,
            source_data: None,
            ua_info: None,
            remote_address: None,
        }
    }

    pub fn with_source(mut self, source_type: Option<SourceType>, source_data: Option<serde_json::Value>) -> Self {
        self.source_type = source_type;
        self.source_data = source_data;
        self
    }

    pub fn with_client(mut self, ua_info: Option<UserAgentInfo>, remote_address: Option<String>) -> Self {
        self.ua_info = ua_info;
        self.remote_address = remote_address;
        self
    }
}

/// Stored visitor, unique per `(scope, hash)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub scope: String,
    pub hash: String,
    pub info: VisitorFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_data: Option<serde_json::Value>,
    #[serde(default)]
    pub ua_info: Option<UserAgentInfo>,
    #[serde(default)]
    pub remote_address: Option<String>,
    pub submits: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VisitorRecord {
    /// A first submission: counter at one.
    pub fn first_submission(registration: VisitorRegistration, hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            scope: registration.scope.key(),
            hash,
            info: registration.fields,
            source_type: registration.source_type,
            source_data: registration.source_data,
            ua_info: registration.ua_info,
            remote_address: registration.remote_address,
            submits: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields refreshed on every repeated submission.
/// An absent source keeps whatever the visitor was stored with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatileFields {
    pub source_type: Option<SourceType>,
    pub source_data: Option<serde_json::Value>,
    pub ua_info: Option<UserAgentInfo>,
    pub remote_address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&VisitorRegistration> for VolatileFields {
    fn from(registration: &VisitorRegistration) -> Self {
        Self {
            source_type: registration.source_type,
            source_data: registration.source_data.clone(),
            ua_info: registration.ua_info.clone(),
            remote_address: registration.remote_address.clone(),
            updated_at: Utc::now(),
        }
    }
}

impl From<&VisitorRecord> for VolatileFields {
    fn from(record: &VisitorRecord) -> Self {
        Self {
            source_type: record.source_type,
            source_data: record.source_data.clone(),
            ua_info: record.ua_info.clone(),
            remote_address: record.remote_address.clone(),
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    pub visitor: VisitorRecord,
    pub already_registered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> VisitorFields {
        VisitorFields {
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_scope_keys() {
        assert_eq!(VisitorScope::Event("E1".into()).key(), "event:E1");
        assert_eq!(VisitorScope::FastTrack.to_string(), "fast-track");
        assert!(!VisitorScope::FastTrack.hashes_optional_fields());
    }

    #[test]
    fn test_field_validation() {
        assert!(fields().validate().is_ok());

        let bad_email = VisitorFields {
            email: "nope".into(),
            ..fields()
        };
        assert!(bad_email.validate().is_err());

        let bad_birthday = VisitorFields {
            birthday: Some("31.12.1990".into()),
            ..fields()
        };
        assert!(bad_birthday.validate().is_err());

        let nameless = VisitorFields {
            first_name: String::new(),
            ..fields()
        };
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn test_first_submission_starts_counter_at_one() {
        let registration = VisitorRegistration::new(VisitorScope::Event("E1".into()), fields());
        let record = VisitorRecord::first_submission(registration, "abc".into());
        assert_eq!(record.submits, 1);
        assert_eq!(record.scope, "event:E1");
        assert_eq!(record.created_at, record.updated_at);
    }
}
