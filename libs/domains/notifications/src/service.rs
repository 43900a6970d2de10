//! The mail outbox: durable enqueue and the background drain.

use chrono::Utc;
use core_config::MailConfig;
use scheduled_job::{HandlerError, IntervalJob, IntervalOptions};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{NotificationError, NotificationResult};
use crate::html_text::html_to_text;
use crate::models::{
    DrainReport, EnqueueOutcome, MailStatus, OutgoingMail, ProcessOutcome, Recipients,
    SendReceipt, Sender, StatusDetail, TemplateData, TemplateMailRecord,
};
use crate::providers::MailTransport;
use crate::repository::MailRepository;
use crate::templates::TemplateEngine;

pub const SENDING_JOB_NAME: &str = "Mail.PerformSending";

/// Queues templated mail and delivers it from a polling job. Cheap to clone.
#[derive(Clone)]
pub struct Mailer {
    repository: Arc<dyn MailRepository>,
    transport: Arc<dyn MailTransport>,
    templates: TemplateEngine,
    config: MailConfig,
}

impl Mailer {
    pub fn new(
        repository: Arc<dyn MailRepository>,
        transport: Arc<dyn MailTransport>,
        templates: TemplateEngine,
        config: MailConfig,
    ) -> Self {
        Self {
            repository,
            transport,
            templates,
            config,
        }
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Persists a pending record. Never fails the caller: a storage error
    /// is logged and reported as [`EnqueueOutcome::Dropped`].
    pub async fn send_template_mail(
        &self,
        recipients: Recipients,
        template_name: &str,
        data: Value,
    ) -> EnqueueOutcome {
        if !self.templates.has_template(template_name) {
            warn!(template = template_name, "Queueing mail for an unknown template");
        }

        let record = TemplateMailRecord::pending(recipients, template_name, data);
        match self.repository.insert(record).await {
            Ok(record) => {
                debug!(mail_id = %record.id, template = template_name, to = ?record.recipients.to, "Mail queued");
                EnqueueOutcome::Queued(record.id)
            }
            Err(e) => {
                error!(template = template_name, error = %e, "Failed to queue mail");
                EnqueueOutcome::Dropped(e.to_string())
            }
        }
    }

    pub async fn send_typed<D: TemplateData + Sync>(
        &self,
        recipients: Recipients,
        data: &D,
    ) -> EnqueueOutcome {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.send_template_mail(recipients, D::TEMPLATE.as_ref(), value)
                    .await
            }
            Err(e) => {
                error!(template = %D::TEMPLATE, error = %e, "Failed to serialize mail data");
                EnqueueOutcome::Dropped(e.to_string())
            }
        }
    }

    /// One drain pass over every pending record, oldest first.
    pub async fn process_pending(&self) -> NotificationResult<DrainReport> {
        let pending = self.repository.find_pending().await?;
        let mut report = DrainReport::default();

        for record in pending {
            report.add(self.process_record(record).await);
        }

        if report.processed() > 0 {
            info!(
                sent = report.sent,
                render_failed = report.render_failed,
                send_failed = report.send_failed,
                "Mail drain finished"
            );
        }
        Ok(report)
    }

    async fn process_record(&self, mut record: TemplateMailRecord) -> ProcessOutcome {
        record.attempts += 1;
        record.updated_at = Utc::now();
        self.persist(&record).await;

        let rendered = match self.templates.render(&record.template_name, &record.data) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(mail_id = %record.id, template = %record.template_name, error = %e, "Mail render failed");
                record.status = MailStatus::Failed;
                record.status_detail = Some(StatusDetail::error(e.to_string()));
                record.updated_at = Utc::now();
                self.persist(&record).await;
                return ProcessOutcome::RenderFailed;
            }
        };

        let mail = OutgoingMail {
            message_id: Some(record.id.clone()),
            from: None,
            recipients: record.recipients.clone(),
            subject: Some(rendered.subject),
            html: Some(rendered.html),
            text: rendered.text,
        };

        let outcome = match self.send_mail(mail).await {
            Ok(receipt) => {
                record.status = MailStatus::Sent;
                record.status_detail = Some(receipt.into());
                ProcessOutcome::Sent
            }
            Err(e) => {
                warn!(
                    mail_id = %record.id,
                    attempts = record.attempts,
                    error = %e,
                    "Mail send failed, will retry"
                );
                record.status_detail = Some(StatusDetail::error(e.to_string()));
                ProcessOutcome::SendFailed
            }
        };

        record.updated_at = Utc::now();
        self.persist(&record).await;
        outcome
    }

    async fn persist(&self, record: &TemplateMailRecord) {
        if let Err(e) = self.repository.save(record).await {
            error!(mail_id = %record.id, status = %record.status, error = %e, "Failed to update mail record");
        }
    }

    /// Sends a rendered mail directly, bypassing the outbox.
    pub async fn send_mail(&self, mut mail: OutgoingMail) -> NotificationResult<SendReceipt> {
        let Some(html) = mail.html.as_deref().filter(|html| !html.is_empty()) else {
            return Err(NotificationError::InvalidMail("HTML body is missing".to_string()));
        };
        if mail.subject.as_deref().is_none_or(str::is_empty) {
            return Err(NotificationError::InvalidMail("subject is missing".to_string()));
        }

        if mail.text.as_deref().is_none_or(|text| text.trim().is_empty()) {
            mail.text = Some(html_to_text(html));
        }
        if mail.from.is_none() {
            mail.from = Some(Sender {
                address: self.config.default_from.clone(),
                name: Some(self.config.default_from_name.clone()),
            });
        }

        self.transport.send(&mail).await
    }

    /// Logs whether the transport is reachable. Never fatal.
    pub async fn verify_transport(&self) -> bool {
        match self.transport.verify().await {
            Ok(true) => {
                info!(transport = self.transport.name(), "Mail transport is ready");
                true
            }
            Ok(false) => {
                warn!(transport = self.transport.name(), "Mail transport refused the connection");
                false
            }
            Err(e) => {
                warn!(transport = self.transport.name(), error = %e, "Mail transport check failed");
                false
            }
        }
    }

    /// The drain job, polling every `poll_interval` of idle time.
    pub fn sending_job(&self) -> IntervalJob {
        let mailer = self.clone();
        IntervalJob::new(
            SENDING_JOB_NAME,
            IntervalOptions::every(self.config.poll_interval),
            move || {
                let mailer = mailer.clone();
                async move {
                    mailer
                        .process_pending()
                        .await
                        .map(|_| ())
                        .map_err(|e| Box::new(e) as HandlerError)
                }
            },
        )
    }
}
