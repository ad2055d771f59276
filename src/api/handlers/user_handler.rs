//! Admin user management under `/api/auth`.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::parse_id;
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    /// user, shop_owner or admin
    #[validate(length(min = 1, message = "Role is required"))]
    #[schema(example = "shop_owner")]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PromoteAdminRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "owner@example.com")]
    pub email: String,
}

/// Confirmation message plus the affected user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: UserResponse,
}

impl UserMessageResponse {
    fn new(message: impl Into<String>, user: impl Into<UserResponse>) -> Self {
        Self {
            message: message.into(),
            user: user.into(),
        }
    }
}

/// Admin-only user routes; mounted behind the bearer and admin guards.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id", get(get_user))
        .route("/users/:user_id/role", put(update_role))
        .route("/users/:user_id/toggle-status", patch(toggle_user_status))
        .route("/promote-admin", post(promote_admin))
}

/// List all users, newest first
#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get one user
#[utoipa::path(
    get,
    path = "/api/auth/users/{userId}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("userId" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(parse_id(&user_id)?).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/api/auth/users/{userId}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("userId" = Uuid, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "User role updated successfully", body = UserMessageResponse),
        (status = 400, description = "Invalid role"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> AppResult<Json<UserMessageResponse>> {
    let user = state
        .user_service
        .update_role(parse_id(&user_id)?, &payload.role)
        .await?;

    Ok(Json(UserMessageResponse::new(
        "User role updated successfully",
        user,
    )))
}

/// Activate or deactivate a user
#[utoipa::path(
    patch,
    path = "/api/auth/users/{userId}/toggle-status",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("userId" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Status flipped", body = UserMessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserMessageResponse>> {
    let user = state
        .user_service
        .toggle_status(parse_id(&user_id)?)
        .await?;
    let verb = if user.is_active {
        "activated"
    } else {
        "deactivated"
    };

    Ok(Json(UserMessageResponse::new(
        format!("User {} successfully", verb),
        user,
    )))
}

/// Grant the admin role by email
#[utoipa::path(
    post,
    path = "/api/auth/promote-admin",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = PromoteAdminRequest,
    responses(
        (status = 200, description = "User promoted to admin successfully", body = UserMessageResponse),
        (status = 400, description = "Email is required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn promote_admin(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PromoteAdminRequest>,
) -> AppResult<Json<UserMessageResponse>> {
    let user = state.user_service.promote_to_admin(&payload.email).await?;

    Ok(Json(UserMessageResponse::new(
        "User promoted to admin successfully",
        user,
    )))
}
