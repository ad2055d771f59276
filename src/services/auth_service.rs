//! Authentication service - password and federated sign-in.
//!
//! Local sessions are HS256 tokens signed with `JWT_SECRET`. Federated
//! sessions start from an identity-provider token that is verified and
//! reconciled with the local user table before a local token is issued.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, PASSWORD_RESET_TTL_SECONDS};
use crate::domain::{
    generate_reset_token, normalize_email, reconcile, AdminEmails, FederatedClaims, NewUser,
    Password, Reconciliation, User, UserRole,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{DataStore, IdentityVerifier, OutgoingEmail};
use crate::jobs::EmailQueue;

const DEACTIVATED: &str = "Account is deactivated. Please contact support.";
const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// A signed-in user and the local token issued for them.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Password registration input, already shape-validated by the handler.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, registration: Registration) -> AppResult<AuthSession>;

    async fn login(&self, email: String, password: String) -> AppResult<AuthSession>;

    /// Verify an identity-provider token and sign the matching user in.
    async fn federated_login(&self, id_token: String) -> AppResult<AuthSession>;

    /// Resolve a bearer token (local or federated) to an active user.
    async fn authenticate(&self, token: &str) -> AppResult<User>;

    /// Verify a local token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: String,
        new_password: String,
    ) -> AppResult<()>;

    /// Start a password reset. The token is only returned in development.
    async fn forgot_password(&self, email: String) -> AppResult<Option<String>>;

    async fn reset_password(&self, token: String, new_password: String) -> AppResult<()>;

    async fn logout(&self, user_id: Uuid) -> AppResult<()>;
}

/// Generate JWT token for a user
fn generate_token(user: &User, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?)
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

fn ensure_active(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(AppError::unauthorized(DEACTIVATED))
    }
}

fn reset_email(to: &str, token: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Password reset request".to_string(),
        html: format!(
            "<p>We received a request to reset your password.</p>\
             <p>Your reset token is <code>{}</code>. It expires in one hour.</p>\
             <p>If you did not ask for this, you can ignore this email.</p>",
            token
        ),
        text: format!(
            "We received a request to reset your password.\n\
             Your reset token is {}. It expires in one hour.\n\
             If you did not ask for this, you can ignore this email.",
            token
        ),
    }
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    store: Arc<dyn DataStore>,
    identity: Arc<dyn IdentityVerifier>,
    email_queue: Arc<dyn EmailQueue>,
    admins: AdminEmails,
    config: Config,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn DataStore>,
        identity: Arc<dyn IdentityVerifier>,
        email_queue: Arc<dyn EmailQueue>,
        config: Config,
    ) -> Self {
        let admins = AdminEmails::new(&config.admin_emails);
        Self {
            store,
            identity,
            email_queue,
            admins,
            config,
        }
    }

    fn session(&self, user: User) -> AppResult<AuthSession> {
        let token = generate_token(&user, &self.config)?;
        Ok(AuthSession { user, token })
    }

    async fn sign_in_federated(&self, claims: FederatedClaims) -> AppResult<User> {
        let user = match self.reconcile_federated(&claims).await {
            // Another sign-in inserted the same subject or email first
            Err(AppError::DuplicateUser) => {
                tracing::debug!(uid = %claims.uid, "Federated user created concurrently, retrying");
                self.reconcile_federated(&claims).await?
            }
            other => other?,
        };

        ensure_active(&user)?;
        Ok(user)
    }

    async fn reconcile_federated(&self, claims: &FederatedClaims) -> AppResult<User> {
        let users = self.store.users();
        let email = normalize_email(&claims.email);

        let (by_uid, by_email) = tokio::try_join!(
            users.find_by_firebase_uid(&claims.uid),
            users.find_by_email(&email)
        )?;

        let outcome = reconcile(claims, by_uid, by_email, &self.admins);
        tracing::debug!(outcome = outcome.kind(), uid = %claims.uid, "Federated sign-in");

        match outcome {
            Reconciliation::Existing(user) | Reconciliation::Linked(user) => users.save(user).await,
            Reconciliation::Create(new_user) => {
                let mut user = users.create(new_user).await?;
                user.record_login();
                users.save(user).await
            }
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, registration: Registration) -> AppResult<AuthSession> {
        let users = self.store.users();
        let email = normalize_email(&registration.email);

        if users.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateUser);
        }

        let password_hash = Password::new(&registration.password)?.into_string();
        let mut user = users
            .create(NewUser {
                email,
                password_hash: Some(password_hash),
                firebase_uid: None,
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
                phone: registration.phone,
                display_name: registration.display_name,
                photo_url: String::new(),
                role: UserRole::User,
                email_verified: false,
            })
            .await?;

        user.record_login();
        let user = users.save(user).await?;
        self.session(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<AuthSession> {
        let users = self.store.users();
        let user = match users.find_by_email(&normalize_email(&email)).await? {
            Some(user) => user,
            None => {
                // Same hashing cost as a real account
                Password::dummy().verify(&password);
                return Err(AppError::InvalidCredentials);
            }
        };

        ensure_active(&user)?;

        let hash = user
            .password_hash
            .clone()
            .ok_or_else(|| AppError::unauthorized("This account uses a different login method"))?;

        if !Password::from_hash(hash).verify(&password) {
            return Err(AppError::InvalidCredentials);
        }

        let mut user = user;
        user.record_login();
        let user = users.save(user).await?;
        self.session(user)
    }

    async fn federated_login(&self, id_token: String) -> AppResult<AuthSession> {
        let claims = self.identity.verify(&id_token).await?;
        let user = self.sign_in_federated(claims).await?;
        self.session(user)
    }

    async fn authenticate(&self, token: &str) -> AppResult<User> {
        let header = decode_header(token)?;

        match header.alg {
            Algorithm::HS256 => {
                let claims = self.verify_token(token)?;
                let user = self
                    .store
                    .users()
                    .find_by_id(claims.sub)
                    .await?
                    .ok_or_else(|| AppError::unauthorized("Invalid token. User not found."))?;
                ensure_active(&user)?;
                Ok(user)
            }
            Algorithm::RS256 => {
                let claims = self.identity.verify(token).await?;
                self.sign_in_federated(claims).await
            }
            _ => Err(AppError::unauthorized("Invalid token")),
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: String,
        new_password: String,
    ) -> AppResult<()> {
        let users = self.store.users();
        let mut user = users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let hash = user.password_hash.clone().ok_or_else(|| {
            AppError::bad_request("This account does not use a password. Sign in with your provider.")
        })?;

        if !Password::from_hash(hash).verify(&current_password) {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        user.set_password_hash(Password::new(&new_password)?.into_string());
        users.save(user).await?;
        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn forgot_password(&self, email: String) -> AppResult<Option<String>> {
        let users = self.store.users();
        let Some(mut user) = users.find_by_email(&normalize_email(&email)).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires = Utc::now() + Duration::seconds(PASSWORD_RESET_TTL_SECONDS);
        user.set_reset_token(token.clone(), expires);
        let user = users.save(user).await?;

        self.email_queue
            .enqueue(reset_email(&user.email, &token))
            .await?;
        tracing::info!(user_id = %user.id, "Password reset email queued");

        Ok(self.config.is_development().then_some(token))
    }

    async fn reset_password(&self, token: String, new_password: String) -> AppResult<()> {
        Password::check_length(&new_password)?;

        let users = self.store.users();
        let mut user = users
            .find_by_reset_token(&token)
            .await?
            .ok_or_else(|| AppError::bad_request(INVALID_RESET_TOKEN))?;

        if !user.reset_token_valid(&token, Utc::now()) {
            return Err(AppError::bad_request(INVALID_RESET_TOKEN));
        }

        user.set_password_hash(Password::new(&new_password)?.into_string());
        let user = users.save(user).await?;
        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    async fn logout(&self, user_id: Uuid) -> AppResult<()> {
        let users = self.store.users();
        let mut user = users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        user.record_login();
        users.save(user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::fixtures::user;
    use crate::infra::{
        MockDataStore, MockIdentityVerifier, MockJewelryRepository, MockUserRepository,
        UserRepository,
    };
    use crate::jobs::MockEmailQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "test-secret-key-for-testing-only-32chars";

    fn config() -> Config {
        let mut config = Config::for_secret(SECRET);
        config.admin_emails = vec!["boss@example.com".to_string()];
        config
    }

    fn service(
        users: MockUserRepository,
        identity: MockIdentityVerifier,
        queue: MockEmailQueue,
    ) -> Authenticator {
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let mut store = MockDataStore::new();
        store.expect_users().returning(move || users.clone());
        store
            .expect_jewelry()
            .returning(|| Arc::new(MockJewelryRepository::new()));
        Authenticator::new(Arc::new(store), Arc::new(identity), Arc::new(queue), config())
    }

    fn users_only(users: MockUserRepository) -> Authenticator {
        service(users, MockIdentityVerifier::new(), MockEmailQueue::new())
    }

    fn created_from(new_user: NewUser) -> User {
        let mut created = user(&new_user.email, new_user.role);
        created.password_hash = new_user.password_hash.clone();
        created.firebase_uid = new_user.firebase_uid.clone();
        created.display_name = new_user.resolved_display_name();
        created
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

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(email, UserRole::User))));

        let err = users_only(users)
            .register(registration("Jane@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
    }

    #[tokio::test]
    async fn test_register_creates_user_and_issues_token() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "jane@example.com")
            .returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|n| n.role == UserRole::User && n.password_hash.is_some())
            .returning(|n| Ok(created_from(n)));
        users.expect_save().returning(Ok);

        let svc = users_only(users);
        let session = svc.register(registration(" Jane@Example.com ")).await.unwrap();

        assert_eq!(session.user.email, "jane@example.com");
        assert!(session.user.last_login.is_some());
        let claims = svc.verify_token(&session.token).unwrap();
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(claims.role, "user");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let mut input = registration("jane@example.com");
        input.password = "123".to_string();
        let err = users_only(users).register(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_invalid_credentials() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let err = users_only(users)
            .login("nobody@example.com".into(), "whatever".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            let mut u = user(email, UserRole::User);
            u.password_hash = Some(Password::new("right-password").unwrap().into_string());
            Ok(Some(u))
        });

        let err = users_only(users)
            .login("jane@example.com".into(), "wrong-password".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_federated_only_account() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            let mut u = user(email, UserRole::User);
            u.password_hash = None;
            u.firebase_uid = Some("uid".to_string());
            Ok(Some(u))
        });

        let err = users_only(users)
            .login("jane@example.com".into(), "whatever".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("different login method")));
    }

    #[tokio::test]
    async fn test_login_deactivated_account() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            let mut u = user(email, UserRole::User);
            u.password_hash = Some(Password::new("secret123").unwrap().into_string());
            u.is_active = false;
            Ok(Some(u))
        });

        let err = users_only(users)
            .login("jane@example.com".into(), "secret123".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == DEACTIVATED));
    }

    #[tokio::test]
    async fn test_login_deactivated_account_with_wrong_password() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            let mut u = user(email, UserRole::User);
            u.password_hash = Some(Password::new("secret123").unwrap().into_string());
            u.is_active = false;
            Ok(Some(u))
        });

        let err = users_only(users)
            .login("jane@example.com".into(), "wrong-password".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == DEACTIVATED));
    }

    #[tokio::test]
    async fn test_login_deactivated_federated_only_account() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            let mut u = user(email, UserRole::User);
            u.password_hash = None;
            u.firebase_uid = Some("uid".to_string());
            u.is_active = false;
            Ok(Some(u))
        });

        let err = users_only(users)
            .login("jane@example.com".into(), "whatever".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == DEACTIVATED));
    }

    #[tokio::test]
    async fn test_register_loses_insert_race() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::DuplicateUser));
        users.expect_save().never();

        let err = users_only(users)
            .register(registration("jane@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "User with this email already exists");
    }

    #[tokio::test]
    async fn test_authenticate_local_token() {
        let account = user("jane@example.com", UserRole::ShopOwner);
        let token = generate_token(&account, &config()).unwrap();

        let mut users = MockUserRepository::new();
        let found = account.clone();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));

        let resolved = users_only(users).authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, account.id);
        assert_eq!(resolved.role, UserRole::ShopOwner);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_deactivated_user() {
        let mut account = user("jane@example.com", UserRole::User);
        account.is_active = false;
        let token = generate_token(&account, &config()).unwrap();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(account.clone())));

        let err = users_only(users).authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let err = users_only(MockUserRepository::new())
            .authenticate("not-a-token")
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_federated_login_creates_admin_for_configured_email() {
        let mut identity = MockIdentityVerifier::new();
        identity.expect_verify().returning(|_| {
            Ok(FederatedClaims {
                uid: "g-123".to_string(),
                email: "Boss@Example.com".to_string(),
                name: Some("Big Boss".to_string()),
                picture: None,
                email_verified: true,
            })
        });

        let mut users = MockUserRepository::new();
        users.expect_find_by_firebase_uid().returning(|_| Ok(None));
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|n| {
                n.role == UserRole::Admin
                    && n.firebase_uid.as_deref() == Some("g-123")
                    && n.first_name == "Big"
                    && n.last_name == "Boss"
            })
            .returning(|n| Ok(created_from(n)));
        users.expect_save().returning(Ok);

        let svc = service(users, identity, MockEmailQueue::new());
        let session = svc.federated_login("id-token".into()).await.unwrap();
        assert_eq!(session.user.role, UserRole::Admin);
        assert!(session.user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_federated_login_links_existing_password_account() {
        let mut identity = MockIdentityVerifier::new();
        identity.expect_verify().returning(|_| {
            Ok(FederatedClaims {
                uid: "g-456".to_string(),
                email: "jane@example.com".to_string(),
                name: None,
                picture: None,
                email_verified: true,
            })
        });

        let mut users = MockUserRepository::new();
        users.expect_find_by_firebase_uid().returning(|_| Ok(None));
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(email, UserRole::User))));
        users
            .expect_save()
            .withf(|u| u.firebase_uid.as_deref() == Some("g-456") && u.has_password())
            .returning(Ok);

        let svc = service(users, identity, MockEmailQueue::new());
        let session = svc.federated_login("id-token".into()).await.unwrap();
        assert!(session.user.is_federated());
    }

    #[tokio::test]
    async fn test_federated_login_reuses_row_created_concurrently() {
        let mut identity = MockIdentityVerifier::new();
        identity.expect_verify().returning(|_| {
            Ok(FederatedClaims {
                uid: "g-789".to_string(),
                email: "sam@example.com".to_string(),
                name: Some("Sam".to_string()),
                picture: None,
                email_verified: true,
            })
        });

        let mut winner = user("sam@example.com", UserRole::User);
        winner.password_hash = None;
        winner.firebase_uid = Some("g-789".to_string());
        let winner_id = winner.id;

        // The first lookup misses; by the time the insert runs the row exists
        let lookups = Arc::new(AtomicUsize::new(0));
        let mut users = MockUserRepository::new();
        let seen = lookups.clone();
        users.expect_find_by_firebase_uid().returning(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(None)
            } else {
                Ok(Some(winner.clone()))
            }
        });
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::DuplicateUser));
        users.expect_save().times(1).returning(Ok);

        let svc = service(users, identity, MockEmailQueue::new());
        let session = svc.federated_login("id-token".into()).await.unwrap();
        assert_eq!(session.user.id, winner_id);
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_silent() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut queue = MockEmailQueue::new();
        queue.expect_enqueue().never();

        let svc = service(users, MockIdentityVerifier::new(), queue);
        assert_eq!(svc.forgot_password("x@example.com".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_forgot_password_queues_email_and_echoes_token_in_development() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(email, UserRole::User))));
        users
            .expect_save()
            .withf(|u| u.password_reset_token.is_some() && u.password_reset_expires.is_some())
            .returning(Ok);
        let mut queue = MockEmailQueue::new();
        queue
            .expect_enqueue()
            .withf(|job| job.to == "jane@example.com")
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(users, MockIdentityVerifier::new(), queue);
        let token = svc
            .forgot_password("jane@example.com".into())
            .await
            .unwrap()
            .expect("token echoed in development");
        assert_eq!(token.len(), 64);
    }

    #[tokio::test]
    async fn test_reset_password_rejects_expired_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_reset_token().returning(|token| {
            let mut u = user("jane@example.com", UserRole::User);
            u.set_reset_token(token.to_string(), Utc::now() - Duration::minutes(1));
            Ok(Some(u))
        });

        let err = users_only(users)
            .reset_password("abc".into(), "new-secret".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_RESET_TOKEN));
    }

    #[tokio::test]
    async fn test_reset_password_sets_new_hash_and_clears_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_reset_token().returning(|token| {
            let mut u = user("jane@example.com", UserRole::User);
            u.set_reset_token(token.to_string(), Utc::now() + Duration::minutes(30));
            Ok(Some(u))
        });
        users
            .expect_save()
            .withf(|u| {
                u.password_reset_token.is_none()
                    && u.password_hash
                        .as_deref()
                        .map(|h| Password::from_hash(h.to_string()).verify("new-secret"))
                        .unwrap_or(false)
            })
            .returning(Ok);

        users_only(users)
            .reset_password("abc".into(), "new-secret".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_change_password_for_federated_only_account() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| {
            let mut u = user("jane@example.com", UserRole::User);
            u.password_hash = None;
            u.firebase_uid = Some("uid".to_string());
            Ok(Some(u))
        });

        let err = users_only(users)
            .change_password(Uuid::new_v4(), "old".into(), "new-secret".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| {
            let mut u = user("jane@example.com", UserRole::User);
            u.password_hash = Some(Password::new("current-pass").unwrap().into_string());
            Ok(Some(u))
        });

        let err = users_only(users)
            .change_password(Uuid::new_v4(), "not-it".into(), "new-secret".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
