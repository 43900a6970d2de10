//! The `users` dispatch target.

use api_dispatch::{
    ActionRegistry, ApiResult, RequestContext, require_admin, require_authenticated,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use validator::Validate;

use crate::models::{NewAccount, ProfileUpdate, User, UserInfo};
use crate::service::UserService;

pub const TARGET: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum UsersAction {
    CreateUser,
    ConfirmEmail,
    RequestEmailConfirm,
    GetProfile,
    UpdateProfile,
    ChangePassword,
    RequestPasswordReset,
    ResetPassword,
}

pub fn registry(service: Arc<UserService>) -> ActionRegistry<UsersAction, UserService> {
    ActionRegistry::new(TARGET, service)
        .validated(UsersAction::CreateUser, create_user)
        .validated(UsersAction::ConfirmEmail, confirm_email)
        .validated(UsersAction::RequestEmailConfirm, request_email_confirm)
        .validated(UsersAction::GetProfile, get_profile)
        .validated(UsersAction::UpdateProfile, update_profile)
        .validated(UsersAction::ChangePassword, change_password)
        .validated(UsersAction::RequestPasswordReset, request_password_reset)
        .validated(UsersAction::ResetPassword, reset_password)
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_info: UserInfo,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserParams {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenParams {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoParams {}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetProfileParams {
    #[serde(default, alias = "id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileParams {
    #[serde(default, alias = "id")]
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordParams {
    pub old_password: String,
    #[validate(length(min = 1))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequestParams {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordParams {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// The caller's own account, or any account for admins.
async fn resolve_user(
    service: &UserService,
    ctx: &RequestContext,
    id: Option<&str>,
) -> ApiResult<User> {
    let caller = require_authenticated(ctx)?;
    match id {
        Some(id) if id != caller.id => {
            require_admin(ctx)?;
            Ok(service.get_user(id).await?)
        }
        _ => Ok(service.get_user(&caller.id).await?),
    }
}

async fn create_user(
    service: Arc<UserService>,
    p: CreateUserParams,
    _ctx: RequestContext,
) -> ApiResult<UserResponse> {
    let user = service
        .create_user(NewAccount {
            email: p.email,
            password: p.password,
            first_name: p.first_name,
            middle_name: p.middle_name,
            last_name: p.last_name,
        })
        .await?;
    Ok(UserResponse { user: user.info() })
}

async fn confirm_email(
    service: Arc<UserService>,
    p: TokenParams,
    _ctx: RequestContext,
) -> ApiResult<Empty> {
    service.confirm_email(&p.token).await?;
    Ok(Empty {})
}

async fn request_email_confirm(
    service: Arc<UserService>,
    _p: NoParams,
    ctx: RequestContext,
) -> ApiResult<Empty> {
    let caller = require_authenticated(&ctx)?;
    service.request_email_confirm(&caller.id).await?;
    Ok(Empty {})
}

async fn get_profile(
    service: Arc<UserService>,
    p: GetProfileParams,
    ctx: RequestContext,
) -> ApiResult<ProfileResponse> {
    let user = resolve_user(&service, &ctx, p.user_id.as_deref()).await?;
    Ok(ProfileResponse {
        user_info: user.info(),
    })
}

async fn update_profile(
    service: Arc<UserService>,
    p: UpdateProfileParams,
    ctx: RequestContext,
) -> ApiResult<ProfileResponse> {
    let user = resolve_user(&service, &ctx, p.user_id.as_deref()).await?;
    let user = service
        .update_profile(
            &user.id,
            ProfileUpdate {
                first_name: p.first_name,
                middle_name: p.middle_name,
                last_name: p.last_name,
            },
        )
        .await?;
    Ok(ProfileResponse {
        user_info: user.info(),
    })
}

async fn change_password(
    service: Arc<UserService>,
    p: ChangePasswordParams,
    ctx: RequestContext,
) -> ApiResult<Empty> {
    let caller = require_authenticated(&ctx)?;
    service
        .change_password(&caller.id, &p.old_password, &p.new_password)
        .await?;
    Ok(Empty {})
}

async fn request_password_reset(
    service: Arc<UserService>,
    p: PasswordResetRequestParams,
    _ctx: RequestContext,
) -> ApiResult<Empty> {
    service.request_password_reset(&p.email).await?;
    Ok(Empty {})
}

async fn reset_password(
    service: Arc<UserService>,
    p: ResetPasswordParams,
    _ctx: RequestContext,
) -> ApiResult<Empty> {
    service.reset_password(&p.token, &p.password).await?;
    Ok(Empty {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryTokenRepository, InMemoryUserRepository};
    use api_dispatch::{
        ApiDispatcher, ApiRequest, CallerIdentity, ErrorKind, RequestSource, UserRole,
    };
    use core_config::{DebugConfig, LinksConfig, MailConfig, SmtpConfig};
    use domain_notifications::{
        InMemoryMailRepository, InMemoryTransport, Mailer, TemplateEngine,
    };
    use serde_json::json;
    use std::time::Duration;

    fn dispatcher() -> ApiDispatcher {
        let mailer = Mailer::new(
            Arc::new(InMemoryMailRepository::new()),
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
        );
        let service = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryTokenRepository::new()),
            mailer,
            LinksConfig::new("https://cloudtickets.io"),
            DebugConfig::default(),
        );
        ApiDispatcher::builder()
            .target(registry(Arc::new(service)))
            .build()
    }

    fn caller(id: &str, role: UserRole) -> Option<CallerIdentity> {
        Some(CallerIdentity {
            id: id.into(),
            email: format!("{id}@x.co"),
            role,
        })
    }

    async fn create(dispatcher: &ApiDispatcher, email: &str) -> String {
        let result = dispatcher
            .execute(ApiRequest::new(
                RequestSource::Http,
                TARGET,
                "createUser",
                json!({ "email": email, "password": "pw", "firstName": "Ivan" }),
            ))
            .await
            .unwrap();
        result.field("user").unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_create_user_returns_info() {
        let dispatcher = dispatcher();
        let result = dispatcher
            .execute(ApiRequest::new(
                RequestSource::Http,
                TARGET,
                "createUser",
                json!({ "email": "Ivan@X.co", "password": "pw" }),
            ))
            .await
            .unwrap();

        let user = result.field("user").unwrap();
        assert_eq!(user["email"], "ivan@x.co");
        assert_eq!(user["emailConfirmed"], false);
        assert!(user.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_create_user_rejects_bad_email() {
        let err = dispatcher()
            .execute(ApiRequest::new(
                RequestSource::Http,
                TARGET,
                "createUser",
                json!({ "email": "nope", "password": "pw" }),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_duplicate_user_is_forbidden() {
        let dispatcher = dispatcher();
        create(&dispatcher, "a@b.co").await;
        let err = dispatcher
            .execute(ApiRequest::new(
                RequestSource::Http,
                TARGET,
                "createUser",
                json!({ "email": "a@b.co", "password": "pw" }),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_profile_access_rules() {
        let dispatcher = dispatcher();
        let owner = create(&dispatcher, "owner@x.co").await;
        let other = create(&dispatcher, "other@x.co").await;

        let anonymous = dispatcher
            .execute(ApiRequest::new(RequestSource::Http, TARGET, "getProfile", json!({})))
            .await
            .unwrap_err();
        assert_eq!(anonymous.kind(), ErrorKind::Unauthorized);

        let own = dispatcher
            .execute(
                ApiRequest::new(RequestSource::Http, TARGET, "getProfile", json!({}))
                    .with_user(caller(&owner, UserRole::User)),
            )
            .await
            .unwrap();
        assert_eq!(own.field("userInfo").unwrap()["email"], "owner@x.co");

        let foreign = dispatcher
            .execute(
                ApiRequest::new(
                    RequestSource::Http,
                    TARGET,
                    "getProfile",
                    json!({ "userId": other }),
                )
                .with_user(caller(&owner, UserRole::User)),
            )
            .await
            .unwrap_err();
        assert_eq!(foreign.kind(), ErrorKind::Forbidden);

        let as_admin = dispatcher
            .execute(
                ApiRequest::new(
                    RequestSource::Http,
                    TARGET,
                    "updateProfile",
                    json!({ "userId": other, "lastName": "Petrov" }),
                )
                .with_user(caller("admin", UserRole::Admin)),
            )
            .await
            .unwrap();
        assert_eq!(as_admin.field("userInfo").unwrap()["lastName"], "Petrov");

        let missing = dispatcher
            .execute(
                ApiRequest::new(
                    RequestSource::Http,
                    TARGET,
                    "getProfile",
                    json!({ "userId": "nobody" }),
                )
                .with_user(caller("admin", UserRole::Admin)),
            )
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_change_password_with_wrong_old_one() {
        let dispatcher = dispatcher();
        let id = create(&dispatcher, "a@b.co").await;
        let err = dispatcher
            .execute(
                ApiRequest::new(
                    RequestSource::Http,
                    TARGET,
                    "changePassword",
                    json!({ "oldPassword": "bad", "newPassword": "n3w" }),
                )
                .with_user(caller(&id, UserRole::User)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let err = dispatcher()
            .execute(ApiRequest::new(
                RequestSource::Http,
                TARGET,
                "confirmEmail",
                json!({ "token": "missing" }),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
