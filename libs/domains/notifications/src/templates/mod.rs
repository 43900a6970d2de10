//! Handlebars mail templates.
//!
//! Each template has a subject, an HTML body and optionally a plain-text body,
//! registered as `<name>.subject`, `<name>.html` and `<name>.text`.

use handlebars::{Handlebars, no_escape};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{NotificationError, NotificationResult};
use crate::models::MailTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
    /// `None` when the template has no text variant
    pub text: Option<String>,
}

/// Template registry. Cheap to clone.
#[derive(Clone)]
pub struct TemplateEngine {
    /// HTML-escaping registry for bodies
    html: Arc<Handlebars<'static>>,
    /// Non-escaping registry for subjects and text bodies
    plain: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Engine with the built-in templates.
    pub fn new() -> NotificationResult<Self> {
        Self::builder()
            .template(
                MailTemplate::UserRegistered.as_ref(),
                USER_REGISTERED_SUBJECT,
                USER_REGISTERED_HTML,
                Some(USER_REGISTERED_TEXT),
            )?
            .template(
                MailTemplate::UserPasswordReset.as_ref(),
                USER_PASSWORD_RESET_SUBJECT,
                USER_PASSWORD_RESET_HTML,
                Some(USER_PASSWORD_RESET_TEXT),
            )?
            .build()
    }

    pub fn builder() -> TemplateEngineBuilder {
        TemplateEngineBuilder::default()
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.html.has_template(&format!("{}.html", name))
    }

    pub fn render(&self, name: &str, data: &Value) -> NotificationResult<RenderedMail> {
        if !self.has_template(name) {
            return Err(NotificationError::UnknownTemplate(name.to_string()));
        }
        debug!(template = name, "Rendering mail template");

        let subject = self.plain.render(&format!("{}.subject", name), data)?;
        let html = self.html.render(&format!("{}.html", name), data)?;

        let text_key = format!("{}.text", name);
        let text = if self.plain.has_template(&text_key) {
            Some(self.plain.render(&text_key, data)?)
        } else {
            None
        };

        Ok(RenderedMail {
            subject: subject.trim().to_string(),
            html,
            text,
        })
    }
}

#[derive(Default)]
pub struct TemplateEngineBuilder {
    html: Handlebars<'static>,
    plain: Handlebars<'static>,
}

impl TemplateEngineBuilder {
    pub fn template(
        mut self,
        name: &str,
        subject: &str,
        html: &str,
        text: Option<&str>,
    ) -> NotificationResult<Self> {
        self.plain
            .register_template_string(&format!("{}.subject", name), subject)?;
        self.html.register_template_string(&format!("{}.html", name), html)?;
        if let Some(text) = text {
            self.plain.register_template_string(&format!("{}.text", name), text)?;
        }
        Ok(self)
    }

    pub fn build(mut self) -> NotificationResult<TemplateEngine> {
        self.plain.register_escape_fn(no_escape);
        Ok(TemplateEngine {
            html: Arc::new(self.html),
            plain: Arc::new(self.plain),
        })
    }
}

// ============================================================================
// Mail Templates
// ============================================================================

const USER_REGISTERED_SUBJECT: &str = "Welcome to Awesome Service, please confirm your email";

const USER_REGISTERED_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Confirm your email</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f6f6f6;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 580px; margin: 0 auto; padding: 24px 12px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 4px; padding: 32px;">
        <h1 style="color: #222222; font-size: 22px; font-weight: 600; margin: 0 0 16px 0;">
          Hello{{#if user.firstName}}, {{user.firstName}}{{/if}}!
        </h1>
        <p style="color: #444444; font-size: 15px; line-height: 22px; margin: 0 0 16px 0;">
          Your account <strong>{{user.email}}</strong> has been created.
          Please confirm your email address to finish the registration.
        </p>
        <table width="100%" cellspacing="0" cellpadding="0" style="margin: 24px 0;">
          <tr>
            <td style="text-align: center;">
              <a href="{{emailConfirmLink}}" style="display: inline-block; background-color: #3498db; color: #ffffff; font-size: 15px; padding: 12px 28px; text-decoration: none; border-radius: 4px;">Confirm email</a>
            </td>
          </tr>
        </table>
        <p style="color: #888888; font-size: 13px; margin: 0;">
          If you did not sign up, just ignore this message.
        </p>
      </td>
    </tr>
  </table>
</body>
</html>
"#;

const USER_REGISTERED_TEXT: &str = r#"Hello{{#if user.firstName}}, {{user.firstName}}{{/if}}!

Your account {{user.email}} has been created.
Please confirm your email address to finish the registration:

{{emailConfirmLink}}

If you did not sign up, just ignore this message.
"#;

const USER_PASSWORD_RESET_SUBJECT: &str = "Password reset for Awesome Service";

const USER_PASSWORD_RESET_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Password reset</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f6f6f6;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 580px; margin: 0 auto; padding: 24px 12px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 4px; padding: 32px;">
        <h1 style="color: #222222; font-size: 22px; font-weight: 600; margin: 0 0 16px 0;">Password reset</h1>
        <p style="color: #444444; font-size: 15px; line-height: 22px; margin: 0 0 16px 0;">
          Someone asked to reset the password of <strong>{{user.email}}</strong>.
          Follow the link below to choose a new one.
        </p>
        <p style="margin: 24px 0; text-align: center;">
          <a href="{{passwordResetLink}}" style="display: inline-block; background-color: #3498db; color: #ffffff; font-size: 15px; padding: 12px 28px; text-decoration: none; border-radius: 4px;">Reset password</a>
        </p>
        <p style="color: #888888; font-size: 13px; margin: 0;">
          If it was not you, your password stays the same.
        </p>
      </td>
    </tr>
  </table>
</body>
</html>
"#;

const USER_PASSWORD_RESET_TEXT: &str = r#"Someone asked to reset the password of {{user.email}}.
Follow the link below to choose a new one:

{{passwordResetLink}}

If it was not you, your password stays the same.
"#;
