//! Outbox records and mail payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MailStatus {
    Pending,
    Sent,
    Failed,
}

/// Known templates. Records store the name as a string so unknown names
/// survive a round trip and fail at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum MailTemplate {
    UserRegistered,
    UserPasswordReset,
}

/// Typed payload for a [`MailTemplate`].
pub trait TemplateData: Serialize {
    const TEMPLATE: MailTemplate;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
}

impl Recipients {
    pub fn to(address: impl Into<String>) -> Self {
        Self {
            to: vec![address.into()],
            ..Default::default()
        }
    }

    pub fn with_cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    pub fn with_bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }
}

/// The account a mail is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisteredMail {
    pub user: MailUser,
    pub email_confirm_link: String,
}

impl TemplateData for UserRegisteredMail {
    const TEMPLATE: MailTemplate = MailTemplate::UserRegistered;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPasswordResetMail {
    pub user: MailUser,
    pub password_reset_link: String,
}

impl TemplateData for UserPasswordResetMail {
    const TEMPLATE: MailTemplate = MailTemplate::UserPasswordReset;
}

/// Last outcome of processing a record: the error or the transport receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl StatusDetail {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

impl From<SendReceipt> for StatusDetail {
    fn from(receipt: SendReceipt) -> Self {
        Self {
            error: None,
            message_id: receipt.message_id,
            response: Some(receipt.response),
        }
    }
}

/// A queued templated mail, stored in the `sent-mails` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMailRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: MailStatus,
    #[serde(default)]
    pub status_detail: Option<StatusDetail>,
    pub template_name: String,
    pub recipients: Recipients,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Processing passes so far, whatever their outcome
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateMailRecord {
    pub fn pending(recipients: Recipients, template_name: impl Into<String>, data: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            status: MailStatus::Pending,
            status_detail: None,
            template_name: template_name.into(),
            recipients,
            data,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MailStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub address: String,
    pub name: Option<String>,
}

/// A fully rendered message handed to a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMail {
    pub message_id: Option<String>,
    pub from: Option<Sender>,
    pub recipients: Recipients,
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
    /// Server reply, e.g. `250 OK queued`
    pub response: String,
}

/// Result of handing a mail to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued(String),
    /// Persisting failed; the mail will never be sent.
    Dropped(String),
}

impl EnqueueOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, EnqueueOutcome::Queued(_))
    }
}

/// What one processing pass did to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Sent,
    /// Template missing or broken; terminal.
    RenderFailed,
    /// Transport refused; stays pending for the next pass.
    SendFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub sent: usize,
    pub render_failed: usize,
    pub send_failed: usize,
}

impl DrainReport {
    pub fn processed(&self) -> usize {
        self.sent + self.render_failed + self.send_failed
    }

    pub(crate) fn add(&mut self, outcome: ProcessOutcome) {
        match outcome {
            ProcessOutcome::Sent => self.sent += 1,
            ProcessOutcome::RenderFailed => self.render_failed += 1,
            ProcessOutcome::SendFailed => self.send_failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_names() {
        assert_eq!(MailTemplate::UserRegistered.as_ref(), "userRegistered");
        assert_eq!(
            "userPasswordReset".parse::<MailTemplate>().unwrap(),
            MailTemplate::UserPasswordReset
        );
    }

    #[test]
    fn test_new_record_is_pending_without_attempts() {
        let record = TemplateMailRecord::pending(Recipients::to("a@b.co"), "userRegistered", json!({}));
        assert!(record.is_pending());
        assert_eq!(record.attempts, 0);
        assert!(record.status_detail.is_none());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = TemplateMailRecord::pending(
            Recipients::to("a@b.co").with_cc("c@d.co"),
            "userRegistered",
            json!({ "x": 1 }),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["templateName"], "userRegistered");
        assert_eq!(value["recipients"]["cc"][0], "c@d.co");
        assert!(value["recipients"].get("bcc").is_none());
    }
}
