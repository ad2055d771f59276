//! Account flows through the real services over an in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use jewelry_showcase::config::Config;
use jewelry_showcase::domain::{
    CatalogFilter, CatalogSort, CatalogStats, DashboardOverview, FederatedClaims, GroupStat,
    Jewelry, JewelryWithOwner, NewUser, User, UserRole,
};
use jewelry_showcase::errors::{AppError, AppResult};
use jewelry_showcase::infra::{
    DataStore, IdentityVerifier, JewelryRepository, OutgoingEmail, StatGroup, UserRepository,
};
use jewelry_showcase::jobs::{EmailJob, EmailQueue};
use jewelry_showcase::services::{
    AuthService, Authenticator, Registration, UserManager, UserService,
};
use jewelry_showcase::types::PaginationParams;

// =============================================================================
// In-memory collaborators
// =============================================================================

#[derive(Default)]
struct MemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUsers {
    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.rows.lock().unwrap().values().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.email == email))
    }

    async fn find_by_firebase_uid(&self, uid: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.firebase_uid.as_deref() == Some(uid)))
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.password_reset_token.as_deref() == Some(token)))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        new_user.validate()?;
        // Same uniqueness the users table enforces
        let taken = self.find(|u| {
            u.email == new_user.email
                || (u.firebase_uid.is_some() && u.firebase_uid == new_user.firebase_uid)
        });
        if taken.is_some() {
            return Err(AppError::DuplicateUser);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            display_name: new_user.resolved_display_name(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            firebase_uid: new_user.firebase_uid,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            photo_url: new_user.photo_url,
            role: new_user.role,
            is_active: true,
            email_verified: new_user.email_verified,
            last_login: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: User) -> AppResult<User> {
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.rows.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

/// Account flows never touch the catalog.
struct NoCatalog;

fn unused<T>() -> AppResult<T> {
    Err(AppError::internal("catalog not available in this test"))
}

#[async_trait]
impl JewelryRepository for NoCatalog {
    async fn find_by_id(&self, _: Uuid) -> AppResult<Option<JewelryWithOwner>> {
        unused()
    }
    async fn find_item(&self, _: Uuid) -> AppResult<Option<Jewelry>> {
        unused()
    }
    async fn page(
        &self,
        _: &CatalogFilter,
        _: CatalogSort,
        _: PaginationParams,
    ) -> AppResult<(Vec<JewelryWithOwner>, u64)> {
        unused()
    }
    async fn search(&self, _: &str, _: PaginationParams) -> AppResult<(Vec<JewelryWithOwner>, u64)> {
        unused()
    }
    async fn featured(&self, _: u64) -> AppResult<Vec<JewelryWithOwner>> {
        unused()
    }
    async fn list_all(&self) -> AppResult<Vec<JewelryWithOwner>> {
        unused()
    }
    async fn insert(&self, _: Jewelry) -> AppResult<Jewelry> {
        unused()
    }
    async fn save(&self, _: Jewelry) -> AppResult<Jewelry> {
        unused()
    }
    async fn delete(&self, _: Uuid) -> AppResult<bool> {
        unused()
    }
    async fn catalog_stats(&self) -> AppResult<CatalogStats> {
        unused()
    }
    async fn dashboard_overview(&self) -> AppResult<DashboardOverview> {
        unused()
    }
    async fn group_stats(&self, _: StatGroup) -> AppResult<Vec<GroupStat>> {
        unused()
    }
}

struct MemoryStore {
    users: Arc<MemoryUsers>,
}

impl DataStore for MemoryStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn jewelry(&self) -> Arc<dyn JewelryRepository> {
        Arc::new(NoCatalog)
    }
}

/// Accepts `valid:<uid>:<email>` tokens.
struct StaticIdentity;

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, id_token: &str) -> AppResult<FederatedClaims> {
        let mut parts = id_token.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("valid"), Some(uid), Some(email)) => Ok(FederatedClaims {
                uid: uid.to_string(),
                email: email.to_string(),
                name: Some("Fed User".to_string()),
                picture: None,
                email_verified: true,
            }),
            _ => Err(AppError::unauthorized("Invalid identity token")),
        }
    }
}

#[derive(Default)]
struct RecordingQueue {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailQueue for RecordingQueue {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()> {
        self.sent.lock().unwrap().push(job);
        Ok(())
    }
}

struct Harness {
    auth: Authenticator,
    users: UserManager,
    queue: Arc<RecordingQueue>,
}

fn harness(environment: &str) -> Harness {
    let mut config = Config::for_secret("test-secret-key-for-testing-only-32chars");
    config.environment = environment.to_string();
    config.admin_emails = vec!["boss@example.com".to_string()];

    let store: Arc<dyn DataStore> = Arc::new(MemoryStore {
        users: Arc::new(MemoryUsers::default()),
    });
    let queue = Arc::new(RecordingQueue::default());

    Harness {
        auth: Authenticator::new(store.clone(), Arc::new(StaticIdentity), queue.clone(), config),
        users: UserManager::new(store),
        queue,
    }
}

fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_string(),
        password: "secret123".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        phone: None,
        display_name: None,
    }
}

// =============================================================================
// Flows
// =============================================================================

#[tokio::test]
async fn test_register_then_login_and_authenticate() {
    let h = harness("development");

    let session = h.auth.register(registration("Jane@Example.com")).await.unwrap();
    assert_eq!(session.user.email, "jane@example.com");
    assert_eq!(session.user.role, UserRole::User);
    assert_eq!(session.user.display_name, "Jane Doe");
    assert!(session.user.last_login.is_some());

    let login = h
        .auth
        .login("jane@example.com".to_string(), "secret123".to_string())
        .await
        .unwrap();
    let user = h.auth.authenticate(&login.token).await.unwrap();
    assert_eq!(user.id, session.user.id);

    let claims = h.auth.verify_token(&login.token).unwrap();
    assert_eq!(claims.role, "user");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let h = harness("development");
    h.auth.register(registration("jane@example.com")).await.unwrap();

    let err = h
        .auth
        .register(registration("JANE@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User with this email already exists");
}

#[tokio::test]
async fn test_simultaneous_registrations_yield_one_account() {
    let h = harness("development");

    let (first, second) = tokio::join!(
        h.auth.register(registration("jane@example.com")),
        h.auth.register(registration("jane@example.com"))
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let err = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "User with this email already exists");
    assert_eq!(h.users.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deactivated_account_cannot_login_or_authenticate() {
    let h = harness("development");
    let session = h.auth.register(registration("jane@example.com")).await.unwrap();

    let user = h.users.toggle_status(session.user.id).await.unwrap();
    assert!(!user.is_active);

    let err = h
        .auth
        .login("jane@example.com".to_string(), "secret123".to_string())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Account is deactivated. Please contact support."
    );
    assert!(h.auth.authenticate(&session.token).await.is_err());
}

#[tokio::test]
async fn test_password_reset_round() {
    let h = harness("development");
    h.auth.register(registration("jane@example.com")).await.unwrap();

    let token = h
        .auth
        .forgot_password("jane@example.com".to_string())
        .await
        .unwrap()
        .expect("token is echoed in development");
    assert_eq!(token.len(), 64);

    let sent = h.queue.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jane@example.com");
    assert!(sent[0].text.contains(&token));

    h.auth
        .reset_password(token.clone(), "brand-new".to_string())
        .await
        .unwrap();

    // Single use
    assert!(h
        .auth
        .reset_password(token, "another1".to_string())
        .await
        .is_err());

    assert!(h
        .auth
        .login("jane@example.com".to_string(), "brand-new".to_string())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_forgot_password_hides_token_outside_development() {
    let h = harness("production");
    h.auth.register(registration("jane@example.com")).await.unwrap();

    let token = h
        .auth
        .forgot_password("jane@example.com".to_string())
        .await
        .unwrap();
    assert!(token.is_none());
    assert_eq!(h.queue.sent.lock().unwrap().len(), 1);

    let unknown = h
        .auth
        .forgot_password("nobody@example.com".to_string())
        .await
        .unwrap();
    assert!(unknown.is_none());
    assert_eq!(h.queue.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_federated_login_links_and_promotes() {
    let h = harness("development");
    let local = h.auth.register(registration("boss@example.com")).await.unwrap();
    assert_eq!(local.user.role, UserRole::User);

    let session = h
        .auth
        .federated_login("valid:uid-1:boss@example.com".to_string())
        .await
        .unwrap();
    assert_eq!(session.user.id, local.user.id);
    assert_eq!(session.user.firebase_uid.as_deref(), Some("uid-1"));
    assert_eq!(session.user.role, UserRole::Admin);

    // The password keeps working after linking
    assert!(h
        .auth
        .login("boss@example.com".to_string(), "secret123".to_string())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_federated_only_account_rules() {
    let h = harness("development");
    let session = h
        .auth
        .federated_login("valid:uid-2:fed@example.com".to_string())
        .await
        .unwrap();
    assert!(session.user.password_hash.is_none());
    assert_eq!(session.user.display_name, "Fed User");

    let err = h
        .auth
        .login("fed@example.com".to_string(), "whatever".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "This account uses a different login method");

    let err = h
        .auth
        .change_password(session.user.id, "x".to_string(), "another1".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    assert!(h
        .auth
        .federated_login("forged".to_string())
        .await
        .is_err());
}

#[tokio::test]
async fn test_admin_user_management() {
    let h = harness("development");
    let session = h.auth.register(registration("owner@example.com")).await.unwrap();

    let user = h
        .users
        .update_role(session.user.id, "shop_owner")
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::ShopOwner);
    assert!(h.users.update_role(session.user.id, "root").await.is_err());

    let promoted = h.users.promote_to_admin("OWNER@example.com").await.unwrap();
    assert_eq!(promoted.role, UserRole::Admin);

    let err = h.users.promote_to_admin("ghost@example.com").await.unwrap_err();
    assert_eq!(err.to_string(), "User not found");

    assert_eq!(h.users.list_users().await.unwrap().len(), 1);
}
