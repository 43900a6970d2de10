//! Mail outbox
//!
//! Business code queues templated mail; a background job renders and sends it.
//!
//! ```text
//! ┌─────────────────┐
//! │ Action handler  │  ← send_template_mail / send_typed
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   sent-mails    │  ← TemplateMailRecord, status = pending
//! └────────┬────────┘
//!          │  Mail.PerformSending (IntervalJob)
//! ┌────────▼────────┐
//! │ TemplateEngine  │  ← subject, HTML, text (derived from HTML if absent)
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  MailTransport  │  ← SMTP, in-memory
//! └─────────────────┘
//! ```
//!
//! Every pass increments `attempts` before rendering. A render failure is
//! terminal (`failed`); a send failure leaves the record `pending` for the
//! next pass.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mailer = Mailer::new(repository, transport, TemplateEngine::new()?, config.mail);
//! let job = mailer.sending_job();
//! job.start();
//!
//! mailer.send_typed(Recipients::to(&user.email), &UserRegisteredMail { user, email_confirm_link }).await;
//! ```

pub mod error;
pub mod html_text;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod providers;
pub mod repository;
pub mod service;
pub mod templates;

pub use crate::mongodb::MongoMailRepository;
pub use error::{NotificationError, NotificationResult};
pub use memory::InMemoryMailRepository;
pub use models::{
    DrainReport, EnqueueOutcome, MailStatus, MailTemplate, MailUser, OutgoingMail, Recipients,
    SendReceipt, Sender, StatusDetail, TemplateData, TemplateMailRecord, UserPasswordResetMail,
    UserRegisteredMail,
};
pub use providers::{InMemoryTransport, MailTransport, SmtpTransport};
pub use repository::MailRepository;
pub use service::{Mailer, SENDING_JOB_NAME};
pub use templates::{RenderedMail, TemplateEngine};
