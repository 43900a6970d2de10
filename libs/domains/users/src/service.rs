use core_config::{DebugConfig, LinksConfig};
use domain_notifications::{
    Mailer, MailUser, Recipients, UserPasswordResetMail, UserRegisteredMail,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{UserError, UserResult};
use crate::models::{NewAccount, ProfileUpdate, TokenKind, User, VerificationToken};
use crate::repository::{TokenRepository, UserRepository};
use crate::token::{hash_password, verify_password};

/// Account lifecycle: registration, confirmation, password changes.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    mailer: Mailer,
    links: LinksConfig,
    debug: DebugConfig,
}

fn mail_user(user: &User) -> MailUser {
    MailUser {
        id: user.id.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        middle_name: user.middle_name.clone(),
        last_name: user.last_name.clone(),
    }
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        mailer: Mailer,
        links: LinksConfig,
        debug: DebugConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            links,
            debug,
        }
    }

    pub async fn create_user(&self, account: NewAccount) -> UserResult<User> {
        let email = account.email.to_lowercase();
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let mut user = User::new(&email, hash_password(&account.password)?);
        user.first_name = account.first_name;
        user.middle_name = account.middle_name;
        user.last_name = account.last_name;

        let user = self.users.create(user).await?;
        info!(user_id = %user.id, email = %user.email, "User created");

        let token = self
            .tokens
            .create(VerificationToken::new(&user.id, TokenKind::Email))
            .await?;

        if self.debug.skip_sending_user_registered_mail {
            warn!(email = %user.email, "Registration mail skipped by debug settings");
        } else {
            self.send_email_confirmation(&user, &token).await;
        }

        Ok(user)
    }

    pub async fn confirm_email(&self, token: &str) -> UserResult<User> {
        let (token, mut user) = self.redeem(token, TokenKind::Email).await?;

        user.email_confirmed = true;
        user.active = true;
        user.touch();
        self.users.update(&user).await?;
        info!(email = %user.email, "Email confirmed");

        self.tokens.delete(&token.id).await?;
        Ok(user)
    }

    /// Issues a fresh confirmation token, dropping earlier ones.
    pub async fn request_email_confirm(&self, user_id: &str) -> UserResult<()> {
        let user = self.get_user(user_id).await?;
        if user.email_confirmed {
            return Err(UserError::EmailAlreadyConfirmed);
        }

        self.tokens.delete_for_user(&user.id, TokenKind::Email).await?;
        let token = self
            .tokens
            .create(VerificationToken::new(&user.id, TokenKind::Email))
            .await?;

        self.send_email_confirmation(&user, &token).await;
        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> UserResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> UserResult<User> {
        let mut user = self.get_user(id).await?;
        update.apply(&mut user);
        self.users.update(&user).await?;
        Ok(user)
    }

    pub async fn change_password(
        &self,
        id: &str,
        old_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let mut user = self.get_user(id).await?;
        if !verify_password(old_password, &user.password_hash)? {
            return Err(UserError::WrongPassword);
        }

        user.password_hash = hash_password(new_password)?;
        user.touch();
        self.users.update(&user).await?;
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> UserResult<()> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound(email.to_string()))?;

        let removed = self
            .tokens
            .delete_for_user(&user.id, TokenKind::PasswordReset)
            .await?;
        let token = self
            .tokens
            .create(VerificationToken::new(&user.id, TokenKind::PasswordReset))
            .await?;
        info!(user_id = %user.id, removed, "Password reset token created");

        let mail = UserPasswordResetMail {
            user: mail_user(&user),
            password_reset_link: self.links.password_reset_link(&token.value),
        };
        self.mailer
            .send_typed(Recipients::to(&user.email), &mail)
            .await;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> UserResult<()> {
        let (token, mut user) = self.redeem(token, TokenKind::PasswordReset).await?;

        user.password_hash = hash_password(password)?;
        user.active = true;
        user.touch();
        self.users.update(&user).await?;
        info!(email = %user.email, "Password reset");

        self.tokens.delete(&token.id).await?;
        Ok(())
    }

    /// Login check. Unknown email and wrong password look the same to the caller.
    pub async fn find_by_credentials(&self, email: &str, password: &str) -> UserResult<User> {
        let Some(user) = self.users.get_by_email(email).await? else {
            warn!(email, "Login for unknown email");
            return Err(UserError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(email, "Login with wrong password");
            return Err(UserError::InvalidCredentials);
        }
        if !user.active {
            return Err(UserError::Inactive);
        }
        Ok(user)
    }

    async fn redeem(&self, value: &str, kind: TokenKind) -> UserResult<(VerificationToken, User)> {
        let token = self
            .tokens
            .find(value, kind)
            .await?
            .ok_or(UserError::TokenNotFound)?;

        match self.users.get_by_id(&token.user_id).await? {
            Some(user) => Ok((token, user)),
            None => {
                error!(token_id = %token.id, user_id = %token.user_id, "Token refers to a missing user");
                Err(UserError::Internal("token owner is missing".to_string()))
            }
        }
    }

    async fn send_email_confirmation(&self, user: &User, token: &VerificationToken) {
        let mail = UserRegisteredMail {
            user: mail_user(user),
            email_confirm_link: self.links.email_confirm_link(&token.value),
        };
        self.mailer
            .send_typed(Recipients::to(&user.email), &mail)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryTokenRepository, InMemoryUserRepository};
    use crate::repository::{MockTokenRepository, MockUserRepository};
    use crate::token::TOKEN_LENGTH;
    use core_config::{MailConfig, SmtpConfig};
    use domain_notifications::{
        InMemoryMailRepository, InMemoryTransport, TemplateEngine, TemplateMailRecord,
    };
    use std::time::Duration;

    struct Fixture {
        service: UserService,
        tokens: InMemoryTokenRepository,
        outbox: InMemoryMailRepository,
    }

    fn mailer(outbox: &InMemoryMailRepository) -> Mailer {
        Mailer::new(
            Arc::new(outbox.clone()),
            Arc::new(InMemoryTransport::new()),
            TemplateEngine::new().unwrap(),
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
            },
        )
    }

    fn links() -> LinksConfig {
        LinksConfig::new("https://cloudtickets.io")
    }

    fn fixture_with(debug: DebugConfig) -> Fixture {
        let tokens = InMemoryTokenRepository::new();
        let outbox = InMemoryMailRepository::new();
        let service = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(tokens.clone()),
            mailer(&outbox),
            links(),
            debug,
        );
        Fixture {
            service,
            tokens,
            outbox,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(DebugConfig::default())
    }

    fn account(email: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            password: "pa55word".into(),
            first_name: "Ivan".into(),
            ..Default::default()
        }
    }

    fn link_token(record: &TemplateMailRecord, field: &str) -> String {
        let link = record.data[field].as_str().unwrap();
        link.split("token=").nth(1).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_user_queues_confirmation_mail() {
        let f = fixture();
        let user = f.service.create_user(account("Ivan@X.co")).await.unwrap();
        assert_eq!(user.email, "ivan@x.co");
        assert!(!user.email_confirmed);

        let mails = f.outbox.all().await;
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].template_name, "userRegistered");
        assert_eq!(mails[0].recipients.to, vec!["ivan@x.co".to_string()]);
        let link = mails[0].data["emailConfirmLink"].as_str().unwrap();
        assert!(link.starts_with("https://cloudtickets.io/service-link/confirm-email?token="));
        assert_eq!(link_token(&mails[0], "emailConfirmLink").len(), TOKEN_LENGTH);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let f = fixture();
        f.service.create_user(account("a@b.co")).await.unwrap();
        let err = f.service.create_user(account("A@B.co")).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail(email) if email == "a@b.co"));
    }

    #[tokio::test]
    async fn test_debug_flag_skips_registration_mail() {
        let f = fixture_with(DebugConfig {
            skip_sending_user_registered_mail: true,
        });
        f.service.create_user(account("a@b.co")).await.unwrap();
        assert!(f.outbox.all().await.is_empty());
        assert_eq!(f.tokens.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_email_consumes_token() {
        let f = fixture();
        f.service.create_user(account("a@b.co")).await.unwrap();
        let token = link_token(&f.outbox.all().await[0], "emailConfirmLink");

        let user = f.service.confirm_email(&token).await.unwrap();
        assert!(user.email_confirmed);
        assert!(f.tokens.all().await.is_empty());

        let again = f.service.confirm_email(&token).await.unwrap_err();
        assert!(matches!(again, UserError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_request_email_confirm_replaces_token() {
        let f = fixture();
        let user = f.service.create_user(account("a@b.co")).await.unwrap();
        f.service.request_email_confirm(&user.id).await.unwrap();

        assert_eq!(f.tokens.all().await.len(), 1);
        assert_eq!(f.outbox.all().await.len(), 2);

        let token = link_token(&f.outbox.all().await[1], "emailConfirmLink");
        f.service.confirm_email(&token).await.unwrap();
        let err = f.service.request_email_confirm(&user.id).await.unwrap_err();
        assert!(matches!(err, UserError::EmailAlreadyConfirmed));
    }

    #[tokio::test]
    async fn test_change_password_checks_old_one() {
        let f = fixture();
        let user = f.service.create_user(account("a@b.co")).await.unwrap();

        let err = f
            .service
            .change_password(&user.id, "wrong", "n3w")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::WrongPassword));

        f.service.change_password(&user.id, "pa55word", "n3w").await.unwrap();
        assert!(f.service.find_by_credentials("a@b.co", "n3w").await.is_ok());
        assert!(matches!(
            f.service.find_by_credentials("a@b.co", "pa55word").await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let f = fixture();
        f.service.create_user(account("a@b.co")).await.unwrap();

        f.service.request_password_reset("a@b.co").await.unwrap();
        f.service.request_password_reset("a@b.co").await.unwrap();
        let resets: Vec<_> = f
            .tokens
            .all()
            .await
            .into_iter()
            .filter(|t| t.kind == TokenKind::PasswordReset)
            .collect();
        assert_eq!(resets.len(), 1);

        let mail = f
            .outbox
            .all()
            .await
            .into_iter()
            .rfind(|m| m.template_name == "userPasswordReset")
            .unwrap();
        let link = mail.data["passwordResetLink"].as_str().unwrap();
        assert!(link.starts_with("https://cloudtickets.io/service-link/reset-password?token="));

        let token = link_token(&mail, "passwordResetLink");
        assert_eq!(token, resets[0].value);
        f.service.reset_password(&token, "fresh").await.unwrap();
        assert!(f.service.find_by_credentials("A@b.co", "fresh").await.is_ok());
        assert!(matches!(
            f.service.reset_password(&token, "again").await,
            Err(UserError::TokenNotFound)
        ));
    }

    #[tokio::test]
    async fn test_password_reset_for_unknown_email() {
        let f = fixture();
        let err = f.service.request_password_reset("nobody@x.co").await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_log_in() {
        let mut users = MockUserRepository::new();
        users.expect_get_by_email().returning(|email| {
            let mut user = User::new(email, hash_password("pw").unwrap());
            user.active = false;
            Ok(Some(user))
        });
        let outbox = InMemoryMailRepository::new();
        let service = UserService::new(
            Arc::new(users),
            Arc::new(MockTokenRepository::new()),
            mailer(&outbox),
            links(),
            DebugConfig::default(),
        );

        let err = service.find_by_credentials("a@b.co", "pw").await.unwrap_err();
        assert!(matches!(err, UserError::Inactive));
    }

    #[tokio::test]
    async fn test_token_without_owner_is_internal_error() {
        let mut tokens = MockTokenRepository::new();
        tokens
            .expect_find()
            .returning(|_, kind| Ok(Some(VerificationToken::new("ghost", kind))));
        tokens.expect_delete().never();
        let outbox = InMemoryMailRepository::new();
        let service = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(tokens),
            mailer(&outbox),
            links(),
            DebugConfig::default(),
        );

        let err = service.confirm_email("t").await.unwrap_err();
        assert!(matches!(err, UserError::Internal(_)));
    }
}
