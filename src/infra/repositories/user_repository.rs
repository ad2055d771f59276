//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User};
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Lookup by normalized (lowercase) email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_firebase_uid(&self, uid: &str) -> AppResult<Option<User>>;

    /// Find the user holding a password reset token
    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Insert a new user
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Persist every field of an existing user
    async fn save(&self, user: User) -> AppResult<User>;

    /// All users, newest first
    async fn list(&self) -> AppResult<Vec<User>>;
}

/// Unique index hits (email, firebase uid) become [`AppError::DuplicateUser`].
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateUser,
        _ => AppError::Database(err),
    }
}

/// SeaORM-backed user repository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_by_firebase_uid(&self, uid: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::FirebaseUid.eq(uid))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::PasswordResetToken.eq(token))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        new_user.validate()?;

        let now = Utc::now();
        let display_name = new_user.resolved_display_name();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            firebase_uid: Set(new_user.firebase_uid),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            phone: Set(new_user.phone),
            display_name: Set(display_name),
            photo_url: Set(new_user.photo_url),
            role: Set(new_user.role.to_string()),
            is_active: Set(true),
            email_verified: Set(new_user.email_verified),
            last_login: Set(None),
            password_reset_token: Set(None),
            password_reset_expires: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(write_error)?;
        tracing::info!(user_id = %model.id, role = %model.role, "User created");
        Ok(User::from(model))
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::from(user)
            .update(&self.db)
            .await
            .map_err(write_error)?;
        Ok(User::from(model))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }
}
