//! Drain passes against the in-memory store and transport.

use core_config::{MailConfig, SmtpConfig};
use domain_notifications::{
    EnqueueOutcome, InMemoryMailRepository, InMemoryTransport, MailRepository, MailStatus, Mailer, MailUser,
    Recipients, TemplateEngine, UserRegisteredMail,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Outbox {
    repo: InMemoryMailRepository,
    transport: InMemoryTransport,
    mailer: Mailer,
}

fn mail_config() -> MailConfig {
    MailConfig {
        poll_interval: Duration::from_secs(3),
        default_from: "no-reply@cloudtickets.io".into(),
        default_from_name: "Awesome Service".into(),
        smtp: SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            secure: false,
            username: String::new(),
            password: String::new(),
        },
    }
}

fn outbox_with(templates: TemplateEngine) -> Outbox {
    let repo = InMemoryMailRepository::new();
    let transport = InMemoryTransport::new();
    let mailer = Mailer::new(
        Arc::new(repo.clone()),
        Arc::new(transport.clone()),
        templates,
        mail_config(),
    );
    Outbox {
        repo,
        transport,
        mailer,
    }
}

fn outbox() -> Outbox {
    outbox_with(TemplateEngine::new().unwrap())
}

fn registered() -> UserRegisteredMail {
    UserRegisteredMail {
        user: MailUser {
            id: "u1".into(),
            email: "ivan@x.co".into(),
            first_name: "Ivan".into(),
            ..Default::default()
        },
        email_confirm_link: "https://cloudtickets.io/service-link/confirm-email?token=t".into(),
    }
}

#[tokio::test]
async fn test_send_failure_keeps_record_pending_and_counts_attempts() {
    let outbox = outbox();
    outbox.transport.fail_with("connection refused");
    let id = match outbox
        .mailer
        .send_typed(Recipients::to("ivan@x.co"), &registered())
        .await
    {
        EnqueueOutcome::Queued(id) => id,
        other => panic!("not queued: {other:?}"),
    };

    let report = outbox.mailer.process_pending().await.unwrap();
    assert_eq!(report.send_failed, 1);

    let record = outbox.repo.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(record.status, MailStatus::Pending);
    assert_eq!(record.attempts, 1);
    let detail = record.status_detail.unwrap();
    assert!(detail.error.unwrap().contains("connection refused"));

    outbox.mailer.process_pending().await.unwrap();
    let record = outbox.repo.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(record.status, MailStatus::Pending);
    assert_eq!(record.attempts, 2);

    outbox.transport.recover();
    let report = outbox.mailer.process_pending().await.unwrap();
    assert_eq!(report.sent, 1);
    let record = outbox.repo.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(record.status, MailStatus::Sent);
    assert_eq!(record.attempts, 3);
}

#[tokio::test]
async fn test_render_failure_is_terminal() {
    let outbox = outbox();
    outbox
        .mailer
        .send_template_mail(Recipients::to("ivan@x.co"), "noSuchTemplate", json!({}))
        .await;

    let report = outbox.mailer.process_pending().await.unwrap();
    assert_eq!(report.render_failed, 1);

    let record = &outbox.repo.all().await[0];
    assert_eq!(record.status, MailStatus::Failed);
    assert_eq!(record.attempts, 1);
    assert!(record.status_detail.as_ref().unwrap().error.is_some());

    let report = outbox.mailer.process_pending().await.unwrap();
    assert_eq!(report.processed(), 0);
    assert_eq!(outbox.repo.all().await[0].attempts, 1);
    assert!(outbox.transport.sent().is_empty());
}

#[tokio::test]
async fn test_successful_send_stores_receipt() {
    let outbox = outbox();
    outbox
        .mailer
        .send_typed(Recipients::to("ivan@x.co").with_bcc("audit@x.co"), &registered())
        .await;

    let report = outbox.mailer.process_pending().await.unwrap();
    assert_eq!(report.sent, 1);

    let record = &outbox.repo.all().await[0];
    assert_eq!(record.status, MailStatus::Sent);
    let detail = record.status_detail.as_ref().unwrap();
    assert!(detail.error.is_none());
    assert_eq!(detail.message_id.as_deref(), Some(record.id.as_str()));

    let sent = outbox.transport.sent();
    assert_eq!(sent[0].recipients.bcc, vec!["audit@x.co".to_string()]);
    assert_eq!(
        sent[0].from.as_ref().unwrap().address,
        "no-reply@cloudtickets.io"
    );
    assert!(sent[0].text.as_ref().unwrap().contains("Hello, Ivan!"));
}

#[tokio::test]
async fn test_missing_text_variant_is_derived_from_html() {
    let templates = TemplateEngine::builder()
        .template(
            "notice",
            "Notice",
            "<h2>Notice</h2><p>Open <a href=\"{{link}}\">this</a></p>",
            None,
        )
        .unwrap()
        .build()
        .unwrap();
    let outbox = outbox_with(templates);

    outbox
        .mailer
        .send_template_mail(Recipients::to("ivan@x.co"), "notice", json!({ "link": "https://l" }))
        .await;
    outbox.mailer.process_pending().await.unwrap();

    let text = outbox.transport.sent()[0].text.clone().unwrap();
    assert_eq!(text, "### NOTICE ###\n\nOpen this [https://l]");
}
