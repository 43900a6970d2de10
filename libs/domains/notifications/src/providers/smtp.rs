//! SMTP transport on lettre.

use async_trait::async_trait;
use core_config::SmtpConfig;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, error, info};

use super::MailTransport;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{OutgoingMail, SendReceipt, Sender};

pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    port: u16,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> NotificationResult<Self> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(|e| {
                NotificationError::Transport(format!("Failed to create SMTP relay: {}", e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port);
        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
            port: config.port,
        })
    }
}

fn mailbox(sender: &Sender) -> NotificationResult<Mailbox> {
    Ok(Mailbox::new(sender.name.clone(), sender.address.parse()?))
}

fn parse_all(addresses: &[String]) -> NotificationResult<Vec<Mailbox>> {
    addresses
        .iter()
        .map(|a| {
            a.parse::<Mailbox>()
                .map_err(|e| NotificationError::InvalidMail(format!("bad address '{}': {}", a, e)))
        })
        .collect()
}

/// Builds a multipart/alternative message. Subject, HTML and a sender are required.
pub(crate) fn build_message(mail: &OutgoingMail) -> NotificationResult<Message> {
    let from = mail
        .from
        .as_ref()
        .ok_or_else(|| NotificationError::InvalidMail("sender is missing".to_string()))?;
    let (Some(subject), Some(html)) = (&mail.subject, &mail.html) else {
        return Err(NotificationError::InvalidMail("HTML or subject is missing".to_string()));
    };

    let mut builder = Message::builder().from(mailbox(from)?).subject(subject);
    if let Some(message_id) = &mail.message_id {
        builder = builder.message_id(Some(format!("<{}@tickets>", message_id)));
    }
    for to in parse_all(&mail.recipients.to)? {
        builder = builder.to(to);
    }
    for cc in parse_all(&mail.recipients.cc)? {
        builder = builder.cc(cc);
    }
    for bcc in parse_all(&mail.recipients.bcc)? {
        builder = builder.bcc(bcc);
    }

    builder
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(mail.text.clone().unwrap_or_default()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        )
        .map_err(|e| NotificationError::InvalidMail(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, mail: &OutgoingMail) -> NotificationResult<SendReceipt> {
        debug!(
            to = ?mail.recipients.to,
            host = %self.host,
            port = self.port,
            message_id = ?mail.message_id,
            "Sending mail via SMTP"
        );

        let message = build_message(mail)?;
        let response = self.transport.send(message).await.map_err(|e| {
            error!(to = ?mail.recipients.to, error = %e, "SMTP send failed");
            NotificationError::Transport(format!("SMTP send failed: {}", e))
        })?;

        let reply: Vec<&str> = response.message().collect();
        let receipt = SendReceipt {
            message_id: mail.message_id.clone(),
            response: format!("{} {}", response.code(), reply.join(" ")),
        };
        info!(to = ?mail.recipients.to, response = %receipt.response, "Mail sent via SMTP");
        Ok(receipt)
    }

    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn verify(&self) -> NotificationResult<bool> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| NotificationError::Transport(format!("SMTP verify failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipients;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            message_id: Some("m1".into()),
            from: Some(Sender {
                address: "no-reply@cloudtickets.io".into(),
                name: Some("Awesome Service".into()),
            }),
            recipients: Recipients::to("ivan@x.co").with_bcc("audit@x.co"),
            subject: Some("Hi".into()),
            html: Some("<p>Hi</p>".into()),
            text: Some("Hi".into()),
        }
    }

    #[test]
    fn test_builds_message() {
        let message = build_message(&mail()).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Subject: Hi"));
        assert!(formatted.contains("To: ivan@x.co"));
        assert!(formatted.contains("Message-ID: <m1@tickets>"));
        assert!(formatted.contains("multipart/alternative"));
    }

    #[test]
    fn test_missing_subject_or_html_is_rejected() {
        let no_html = OutgoingMail { html: None, ..mail() };
        assert!(matches!(build_message(&no_html), Err(NotificationError::InvalidMail(_))));

        let no_subject = OutgoingMail { subject: None, ..mail() };
        assert!(matches!(build_message(&no_subject), Err(NotificationError::InvalidMail(_))));
    }

    #[test]
    fn test_bad_recipient_is_rejected() {
        let bad = OutgoingMail {
            recipients: Recipients::to("not an address"),
            ..mail()
        };
        assert!(matches!(build_message(&bad), Err(NotificationError::InvalidMail(_))));
    }

    #[tokio::test]
    async fn test_transport_builds_from_config() {
        let config = SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            secure: false,
            username: String::new(),
            password: String::new(),
        };
        let transport = SmtpTransport::new(&config).unwrap();
        assert_eq!(transport.name(), "smtp");
    }
}
