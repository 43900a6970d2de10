//! Authorization checks that handlers call explicitly.

use crate::context::{CallerIdentity, RequestContext, UserRole};
use crate::error::{ApiError, ApiResult};

/// Anything that belongs to a user account.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

pub fn require_authenticated(ctx: &RequestContext) -> ApiResult<&CallerIdentity> {
    ctx.user
        .as_ref()
        .ok_or_else(|| ApiError::unauthorized("authentication required"))
}

pub fn require_role(ctx: &RequestContext, role: UserRole) -> ApiResult<&CallerIdentity> {
    let user = require_authenticated(ctx)?;
    if user.role != role {
        return Err(ApiError::forbidden("insufficient permissions"));
    }
    Ok(user)
}

pub fn require_admin(ctx: &RequestContext) -> ApiResult<&CallerIdentity> {
    require_role(ctx, UserRole::Admin)
}

/// Admins get no bypass here: the caller must be the owner.
pub fn require_ownership<'a, O>(ctx: &'a RequestContext, object: &O) -> ApiResult<&'a CallerIdentity>
where
    O: Owned + ?Sized,
{
    let user = require_authenticated(ctx)?;
    if object.owner_id() != user.id {
        return Err(ApiError::forbidden("insufficient permissions"));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestSource;
    use crate::error::ErrorKind;

    struct Doc {
        owner: String,
    }

    impl Owned for Doc {
        fn owner_id(&self) -> &str {
            &self.owner
        }
    }

    fn ctx_with(role: Option<UserRole>) -> RequestContext {
        RequestContext::new("cid", RequestSource::Http).with_user(role.map(|role| {
            CallerIdentity {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
                role,
            }
        }))
    }

    #[test]
    fn test_require_authenticated() {
        assert_eq!(
            require_authenticated(&ctx_with(None)).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(require_authenticated(&ctx_with(Some(UserRole::User))).unwrap().id, "u1");
    }

    #[test]
    fn test_require_role() {
        let user = ctx_with(Some(UserRole::User));
        assert_eq!(require_admin(&user).unwrap_err().kind(), ErrorKind::Forbidden);
        assert!(require_role(&user, UserRole::User).is_ok());
        assert_eq!(require_admin(&ctx_with(None)).unwrap_err().kind(), ErrorKind::Unauthorized);
        assert!(require_admin(&ctx_with(Some(UserRole::Admin))).is_ok());
    }

    #[test]
    fn test_require_ownership() {
        let own = Doc { owner: "u1".into() };
        let foreign = Doc { owner: "u2".into() };

        assert!(require_ownership(&ctx_with(Some(UserRole::User)), &own).is_ok());
        assert_eq!(
            require_ownership(&ctx_with(Some(UserRole::Admin)), &foreign)
                .unwrap_err()
                .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            require_ownership(&ctx_with(None), &own).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
    }
}
