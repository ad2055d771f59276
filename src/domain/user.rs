//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{ROLE_ADMIN, ROLE_SHOP_OWNER, ROLE_USER};
use crate::errors::{AppError, AppResult};

/// User roles, ordered from least to most privileged.
///
/// The derived ordering is the authorization hierarchy:
/// `User < ShopOwner < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    ShopOwner,
    Admin,
}

impl UserRole {
    /// Ordinal rank used for permission checks (1..=3).
    pub fn level(&self) -> u8 {
        match self {
            UserRole::User => 1,
            UserRole::ShopOwner => 2,
            UserRole::Admin => 3,
        }
    }

    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// True when this role ranks at or above `required`.
    pub fn has_permission(&self, required: UserRole) -> bool {
        self.level() >= required.level()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => ROLE_USER,
            UserRole::ShopOwner => ROLE_SHOP_OWNER,
            UserRole::Admin => ROLE_ADMIN,
        }
    }

    /// Strict parse for client input.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            ROLE_USER => Ok(UserRole::User),
            ROLE_SHOP_OWNER => Ok(UserRole::ShopOwner),
            ROLE_ADMIN => Ok(UserRole::Admin),
            _ => Err(AppError::validation("Invalid role")),
        }
    }
}

/// Lenient conversion for stored values; unknown roles get the least privilege.
impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        UserRole::parse(s).unwrap_or(UserRole::User)
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub firebase_uid: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub display_name: String,
    pub photo_url: String,
    pub role: UserRole,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn is_federated(&self) -> bool {
        self.firebase_uid.is_some()
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login = Some(now);
        self.updated_at = now;
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Flip the active flag and return the new value.
    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.updated_at = Utc::now();
        self.is_active
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = Some(hash);
        self.password_reset_token = None;
        self.password_reset_expires = None;
        self.updated_at = Utc::now();
    }

    pub fn set_reset_token(&mut self, token: String, expires: DateTime<Utc>) {
        self.password_reset_token = Some(token);
        self.password_reset_expires = Some(expires);
        self.updated_at = Utc::now();
    }

    /// Whether `token` matches an unexpired reset request.
    pub fn reset_token_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.password_reset_token, self.password_reset_expires) {
            (Some(stored), Some(expires)) => stored == token && expires > now,
            _ => false,
        }
    }
}

fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

/// Data required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub firebase_uid: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: String,
    pub role: UserRole,
    pub email_verified: bool,
}

impl NewUser {
    /// Enforce the authentication-method invariant before insert.
    pub fn validate(&self) -> AppResult<()> {
        if self.password_hash.is_none() && self.firebase_uid.is_none() {
            return Err(AppError::validation(
                "Either a password or a federated identity is required",
            ));
        }
        if self.email.is_empty() {
            return Err(AppError::validation("Email is required"));
        }
        Ok(())
    }

    /// Explicit display name, or the full name when none was given.
    pub fn resolved_display_name(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| join_name(&self.first_name, &self.last_name))
    }
}

/// Profile fields a user may change on their own account
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(max = 100, message = "Display name is too long"))]
    #[schema(example = "Jane D.")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    #[validate(url(message = "photoURL must be a valid URL"))]
    #[schema(example = "https://cdn.example.com/avatar.png")]
    pub photo_url: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "Jane Doe")]
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[schema(example = "user")]
    pub role: UserRole,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            display_name: user.display_name,
            photo_url: user.photo_url,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            email_verified: user.email_verified,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Active password user with the given role.
    pub fn user(email: &str, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: Some("hashed".to_string()),
            firebase_uid: None,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: None,
            display_name: "Test User".to_string(),
            photo_url: String::new(),
            role,
            is_active: true,
            email_verified: false,
            last_login: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }
}
