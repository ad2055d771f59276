//! Authentication handlers.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::{MAX_NAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::domain::{ProfileUpdate, UserResponse};
use crate::errors::AppResult;
use crate::services::{AuthSession, Registration};
use crate::types::{Created, MessageResponse};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\+]?[1-9][\d]{0,15}$").expect("Invalid regex"));

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "First name must be 1-50 characters"))]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Last name must be 1-50 characters"))]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "Password must be at least 6 characters long"
    ))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
    #[validate(regex(path = *PHONE_RE, message = "Please provide a valid phone number"))]
    #[schema(example = "+15551234567")]
    pub phone: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone: req.phone.filter(|p| !p.is_empty()),
            display_name: None,
        }
    }
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// Identity-provider sign in
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseAuthRequest {
    /// ID token issued by the identity provider
    #[validate(length(min = 1, message = "idToken is required"))]
    pub id_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "New password must be at least 6 characters long"
    ))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "New password must be at least 6 characters long"
    ))]
    pub new_password: String,
}

/// Issued token plus the signed-in user
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

impl AuthResponse {
    fn new(message: &str, session: AuthSession) -> Self {
        Self {
            message: message.to_string(),
            user: UserResponse::from(session.user),
            token: session.token,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Only present in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

/// Public credential endpoints; mounted behind the auth rate limit.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/firebase-auth", post(firebase_auth))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Endpoints acting on the caller's own account.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/change-password", put(change_password))
        .route("/logout", post(logout))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error or email already registered"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<AuthResponse>> {
    let session = state.auth_service.register(payload.into()).await?;

    Ok(Created(AuthResponse::new(
        "User registered successfully",
        session,
    )))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials or deactivated account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(AuthResponse::new("Login successful", session)))
}

/// Exchange an identity-provider ID token for a local session
#[utoipa::path(
    post,
    path = "/api/auth/firebase-auth",
    tag = "Authentication",
    request_body = FirebaseAuthRequest,
    responses(
        (status = 200, description = "Firebase authentication successful", body = AuthResponse),
        (status = 401, description = "Token rejected or account deactivated")
    )
)]
pub async fn firebase_auth(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<FirebaseAuthRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state.auth_service.federated_login(payload.id_token).await?;

    Ok(Json(AuthResponse::new(
        "Firebase authentication successful",
        session,
    )))
}

/// Start a password reset
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset requested", body = ForgotPasswordResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<ForgotPasswordResponse>> {
    let reset_token = state.auth_service.forgot_password(payload.email).await?;

    Ok(Json(ForgotPasswordResponse {
        message: FORGOT_PASSWORD_MESSAGE.to_string(),
        reset_token,
    }))
}

/// Complete a password reset
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successful", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth_service
        .reset_password(payload.token, payload.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password reset successful")))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_profile(current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update display name or photo
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Account",
    security(("bearer_auth" = [])),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ProfileUpdate>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update_profile(current_user.id, payload)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Change password with the current one
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    tag = "Account",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, description = "Validation error or account has no password"),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth_service
        .change_password(
            current_user.id,
            payload.current_password,
            payload.new_password,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out successfully", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<MessageResponse>> {
    state.auth_service.logout(current_user.id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(phone: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret1".to_string(),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_phone_pattern() {
        assert!(registration(Some("+15551234567")).validate().is_ok());
        assert!(registration(None).validate().is_ok());
        assert!(registration(Some("0123")).validate().is_err());
        assert!(registration(Some("555-1234")).validate().is_err());
    }

    #[test]
    fn test_register_rejects_short_password_and_long_name() {
        let mut req = registration(None);
        req.password = "12345".to_string();
        assert!(req.validate().is_err());

        let mut req = registration(None);
        req.first_name = "x".repeat(51);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_registration_trims_names() {
        let mut req = registration(Some(""));
        req.first_name = "  Jane ".to_string();
        let registration = Registration::from(req);
        assert_eq!(registration.first_name, "Jane");
        assert!(registration.phone.is_none());
    }

    #[test]
    fn test_forgot_password_response_hides_missing_token() {
        let body = serde_json::to_value(ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
            reset_token: None,
        })
        .unwrap();
        assert!(body.get("resetToken").is_none());
    }
}
