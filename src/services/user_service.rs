//! User service - profiles and admin account management.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{normalize_email, ProfileUpdate, User, UserRole};
use crate::errors::{AppResult, OptionExt};
use crate::infra::DataStore;

#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> AppResult<User>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User>;

    /// All users, newest first
    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Set a role from client input; unknown roles are rejected.
    async fn update_role(&self, id: Uuid, role: &str) -> AppResult<User>;

    /// Flip the active flag
    async fn toggle_status(&self, id: Uuid) -> AppResult<User>;

    async fn promote_to_admin(&self, email: &str) -> AppResult<User>;
}

pub struct UserManager {
    store: Arc<dyn DataStore>,
}

impl UserManager {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn require(&self, id: Uuid) -> AppResult<User> {
        self.store.users().find_by_id(id).await?.ok_or_not_found("User")
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_profile(&self, id: Uuid) -> AppResult<User> {
        self.require(id).await
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let mut user = self.require(id).await?;

        if let Some(name) = update.display_name {
            let name = name.trim();
            // A cleared display name falls back to the full name
            user.display_name = if name.is_empty() {
                user.full_name()
            } else {
                name.to_string()
            };
        }
        if let Some(photo) = update.photo_url {
            user.photo_url = photo.trim().to_string();
        }
        user.updated_at = Utc::now();

        self.store.users().save(user).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.store.users().list().await
    }

    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.require(id).await
    }

    async fn update_role(&self, id: Uuid, role: &str) -> AppResult<User> {
        let role = UserRole::parse(role)?;
        let mut user = self.require(id).await?;
        user.set_role(role);

        let user = self.store.users().save(user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User role updated");
        Ok(user)
    }

    async fn toggle_status(&self, id: Uuid) -> AppResult<User> {
        let mut user = self.require(id).await?;
        let active = user.toggle_active();

        let user = self.store.users().save(user).await?;
        tracing::info!(user_id = %user.id, active, "User status toggled");
        Ok(user)
    }

    async fn promote_to_admin(&self, email: &str) -> AppResult<User> {
        let users = self.store.users();
        let mut user = users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_not_found("User")?;

        if user.role.is_admin() {
            return Ok(user);
        }
        user.set_role(UserRole::Admin);

        let user = users.save(user).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::fixtures::user;
    use crate::errors::AppError;
    use crate::infra::{MockDataStore, MockUserRepository, UserRepository};

    fn service(users: MockUserRepository) -> UserManager {
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let mut store = MockDataStore::new();
        store.expect_users().returning(move || users.clone());
        UserManager::new(Arc::new(store))
    }

    fn existing(users: &mut MockUserRepository, role: UserRole) {
        users
            .expect_find_by_id()
            .returning(move |id| {
                let mut u = user("jane@example.com", role);
                u.id = id;
                Ok(Some(u))
            });
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let err = service(users).get_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref e) if e == "User"));
    }

    #[tokio::test]
    async fn test_update_role_rejects_unknown_role() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();

        let err = service(users)
            .update_role(Uuid::new_v4(), "superuser")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid role"));
    }

    #[tokio::test]
    async fn test_update_role_saves_new_role() {
        let mut users = MockUserRepository::new();
        existing(&mut users, UserRole::User);
        users
            .expect_save()
            .withf(|u| u.role == UserRole::ShopOwner)
            .returning(Ok);

        let updated = service(users)
            .update_role(Uuid::new_v4(), "shop_owner")
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::ShopOwner);
    }

    #[tokio::test]
    async fn test_toggle_status_flips_flag() {
        let mut users = MockUserRepository::new();
        existing(&mut users, UserRole::User);
        users.expect_save().returning(Ok);

        let toggled = service(users).toggle_status(Uuid::new_v4()).await.unwrap();
        assert!(!toggled.is_active);
    }

    #[tokio::test]
    async fn test_update_profile_changes_only_given_fields() {
        let mut users = MockUserRepository::new();
        existing(&mut users, UserRole::User);
        users.expect_save().returning(Ok);

        let updated = service(users)
            .update_profile(
                Uuid::new_v4(),
                ProfileUpdate {
                    display_name: Some("  Jay ".to_string()),
                    photo_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Jay");
        assert_eq!(updated.photo_url, "");
    }

    #[tokio::test]
    async fn test_blank_display_name_falls_back_to_full_name() {
        let mut users = MockUserRepository::new();
        existing(&mut users, UserRole::User);
        users.expect_save().returning(Ok);

        let updated = service(users)
            .update_profile(
                Uuid::new_v4(),
                ProfileUpdate {
                    display_name: Some("   ".to_string()),
                    photo_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Test User");
    }

    #[tokio::test]
    async fn test_promote_to_admin_by_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "jane@example.com")
            .returning(|email| Ok(Some(user(email, UserRole::User))));
        users
            .expect_save()
            .withf(|u| u.role == UserRole::Admin)
            .times(1)
            .returning(Ok);

        let promoted = service(users)
            .promote_to_admin("JANE@example.com")
            .await
            .unwrap();
        assert!(promoted.is_admin());
    }

    #[tokio::test]
    async fn test_promote_unknown_email_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let err = service(users)
            .promote_to_admin("ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
