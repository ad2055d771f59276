//! Public catalog handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::parse_id;
use crate::api::extractors::ValidatedQuery;
use crate::api::AppState;
use crate::domain::{CatalogQuery, CatalogStats, Category, CategoryQuery, JewelryResponse, SearchQuery};
use crate::errors::AppResult;
use crate::types::{Page, PaginationMeta};

/// One page of catalog items
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JewelryListResponse {
    pub jewelry: Vec<JewelryResponse>,
    pub pagination: PaginationMeta,
    /// Echo of the search term on `/search`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl From<Page<JewelryResponse>> for JewelryListResponse {
    fn from(page: Page<JewelryResponse>) -> Self {
        Self {
            jewelry: page.items,
            pagination: page.meta,
            search_query: None,
        }
    }
}

pub fn jewelry_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jewelry))
        .route("/search", get(search_jewelry))
        .route("/featured/items", get(featured_jewelry))
        .route("/stats/overview", get(catalog_stats))
        .route("/category/:category", get(jewelry_by_category))
        .route("/:id", get(get_jewelry))
}

/// Browse active items with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/jewelry",
    tag = "Catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Page of items", body = JewelryListResponse),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn list_jewelry(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CatalogQuery>,
) -> AppResult<Json<JewelryListResponse>> {
    let page = state
        .catalog_service
        .list(query.filter(), query.sort(), query.pagination())
        .await?;

    Ok(Json(page.into()))
}

/// Full-text search over active items
#[utoipa::path(
    get,
    path = "/api/jewelry/search",
    tag = "Catalog",
    params(SearchQuery),
    responses(
        (status = 200, description = "Best matches first", body = JewelryListResponse),
        (status = 400, description = "Search query is required")
    )
)]
pub async fn search_jewelry(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> AppResult<Json<JewelryListResponse>> {
    let term = query.term().map(str::to_string);
    let page = state
        .catalog_service
        .search(term.clone(), query.pagination())
        .await?;

    Ok(Json(JewelryListResponse {
        search_query: term,
        ..page.into()
    }))
}

/// Newest featured items
#[utoipa::path(
    get,
    path = "/api/jewelry/featured/items",
    tag = "Catalog",
    responses((status = 200, description = "Featured items", body = Vec<JewelryResponse>))
)]
pub async fn featured_jewelry(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<JewelryResponse>>> {
    Ok(Json(state.catalog_service.featured().await?))
}

/// Price and variety statistics over active items
#[utoipa::path(
    get,
    path = "/api/jewelry/stats/overview",
    tag = "Catalog",
    responses((status = 200, description = "Catalog statistics", body = CatalogStats))
)]
pub async fn catalog_stats(State(state): State<AppState>) -> AppResult<Json<CatalogStats>> {
    Ok(Json(state.catalog_service.stats().await?))
}

/// Active items in one category
#[utoipa::path(
    get,
    path = "/api/jewelry/category/{category}",
    tag = "Catalog",
    params(
        ("category" = Category, Path, description = "Catalog category"),
        CategoryQuery
    ),
    responses(
        (status = 200, description = "Page of items", body = JewelryListResponse),
        (status = 400, description = "Unknown category")
    )
)]
pub async fn jewelry_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    ValidatedQuery(query): ValidatedQuery<CategoryQuery>,
) -> AppResult<Json<JewelryListResponse>> {
    let category: Category = category.parse()?;
    let page = state
        .catalog_service
        .by_category(category, query.sort(), query.pagination())
        .await?;

    Ok(Json(page.into()))
}

/// One active item
#[utoipa::path(
    get,
    path = "/api/jewelry/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item", body = JewelryResponse),
        (status = 404, description = "Jewelry item not found")
    )
)]
pub async fn get_jewelry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JewelryResponse>> {
    Ok(Json(state.catalog_service.get(parse_id(&id)?).await?))
}
