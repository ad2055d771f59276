//! Catalog administration handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, patch, put},
    Extension, Router,
};

use super::parse_id;
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{DashboardStats, JewelryResponse, JewelryUpdate, NewJewelry};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

/// Admin routes; mounted behind the bearer and admin guards.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/jewelry", get(list_all_jewelry).post(create_jewelry))
        .route("/jewelry/:id", put(update_jewelry).delete(delete_jewelry))
        .route("/jewelry/:id/toggle-status", patch(toggle_jewelry_status))
}

/// Totals and per-group breakdowns for the dashboard
#[utoipa::path(
    get,
    path = "/api/admin/dashboard/stats",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.catalog_service.dashboard_stats().await?))
}

/// Every item, inactive ones included
#[utoipa::path(
    get,
    path = "/api/admin/jewelry",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All items, newest first", body = Vec<JewelryResponse>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_all_jewelry(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<JewelryResponse>>> {
    Ok(Json(state.catalog_service.list_all().await?))
}

/// Add an item owned by the calling admin
#[utoipa::path(
    post,
    path = "/api/admin/jewelry",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = NewJewelry,
    responses(
        (status = 201, description = "Created item", body = JewelryResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_jewelry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<NewJewelry>,
) -> AppResult<Created<JewelryResponse>> {
    let item = state
        .catalog_service
        .create(payload, current_user.id)
        .await?;

    tracing::info!(item_id = %item.id, admin = %current_user.email, "Jewelry item created");
    Ok(Created(item))
}

/// Partial update of an item
#[utoipa::path(
    put,
    path = "/api/admin/jewelry/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = JewelryUpdate,
    responses(
        (status = 200, description = "Updated item", body = JewelryResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Jewelry item not found")
    )
)]
pub async fn update_jewelry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<JewelryUpdate>,
) -> AppResult<Json<JewelryResponse>> {
    let item = state
        .catalog_service
        .update(parse_id(&id)?, payload)
        .await?;
    Ok(Json(item))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/api/admin/jewelry/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Jewelry deleted successfully", body = MessageResponse),
        (status = 404, description = "Jewelry item not found")
    )
)]
pub async fn delete_jewelry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state.catalog_service.delete(id).await?;

    tracing::info!(item_id = %id, admin = %current_user.email, "Jewelry item deleted");
    Ok(Json(MessageResponse::new("Jewelry deleted successfully")))
}

/// Show or hide an item in the public catalog
#[utoipa::path(
    patch,
    path = "/api/admin/jewelry/{id}/toggle-status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item with flipped status", body = JewelryResponse),
        (status = 404, description = "Jewelry item not found")
    )
)]
pub async fn toggle_jewelry_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JewelryResponse>> {
    Ok(Json(
        state.catalog_service.toggle_status(parse_id(&id)?).await?,
    ))
}
