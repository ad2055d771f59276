//! Bearer authentication and role guards.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{User, UserRole};
use crate::errors::AppError;

/// Authenticated user resolved from the bearer token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Resolve the bearer token (local or federated) to an active user and
/// inject [`CurrentUser`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    let user = state.auth_service.authenticate(token).await?;
    request.extensions_mut().insert(CurrentUser::from(&user));

    Ok(next.run(request).await)
}

/// Admin-only guard; must run after [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
    require_role(user, UserRole::Admin)?;

    Ok(next.run(request).await)
}

/// Require at least `required` in the role hierarchy.
pub fn require_role(user: &CurrentUser, required: UserRole) -> Result<(), AppError> {
    if user.role.has_permission(required) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Access denied. {} role required.",
            required
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role_follows_hierarchy() {
        assert!(require_role(&current(UserRole::Admin), UserRole::ShopOwner).is_ok());
        assert!(require_role(&current(UserRole::ShopOwner), UserRole::ShopOwner).is_ok());
        assert!(require_role(&current(UserRole::User), UserRole::ShopOwner).is_err());
    }

    #[test]
    fn test_forbidden_message_names_role() {
        let err = require_role(&current(UserRole::User), UserRole::Admin).unwrap_err();
        assert_eq!(err.to_string(), "Access denied. admin role required.");
    }
}
