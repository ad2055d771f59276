//! Catalog service - public browsing and admin management of jewelry items.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::FEATURED_LIMIT;
use crate::domain::{
    CatalogFilter, CatalogSort, CatalogStats, Category, DashboardStats, JewelryResponse,
    JewelryUpdate, NewJewelry,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{DataStore, StatGroup};
use crate::types::{Page, PaginationParams};

const ITEM: &str = "Jewelry item";

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Filtered, sorted page of active items
    async fn list(
        &self,
        filter: CatalogFilter,
        sort: CatalogSort,
        page: PaginationParams,
    ) -> AppResult<Page<JewelryResponse>>;

    /// Text search over active items, best match first
    async fn search(&self, term: Option<String>, page: PaginationParams)
        -> AppResult<Page<JewelryResponse>>;

    async fn by_category(
        &self,
        category: Category,
        sort: CatalogSort,
        page: PaginationParams,
    ) -> AppResult<Page<JewelryResponse>>;

    async fn featured(&self) -> AppResult<Vec<JewelryResponse>>;

    /// Active item by id
    async fn get(&self, id: Uuid) -> AppResult<JewelryResponse>;

    async fn stats(&self) -> AppResult<CatalogStats>;

    async fn dashboard_stats(&self) -> AppResult<DashboardStats>;

    /// Every item including inactive ones
    async fn list_all(&self) -> AppResult<Vec<JewelryResponse>>;

    async fn create(&self, item: NewJewelry, owner: Uuid) -> AppResult<JewelryResponse>;

    async fn update(&self, id: Uuid, update: JewelryUpdate) -> AppResult<JewelryResponse>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Flip the stored active flag
    async fn toggle_status(&self, id: Uuid) -> AppResult<JewelryResponse>;
}

pub struct CatalogManager {
    store: Arc<dyn DataStore>,
}

impl CatalogManager {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CatalogService for CatalogManager {
    async fn list(
        &self,
        filter: CatalogFilter,
        sort: CatalogSort,
        page: PaginationParams,
    ) -> AppResult<Page<JewelryResponse>> {
        let (rows, total) = self.store.jewelry().page(&filter, sort, page).await?;
        Ok(Page::new(rows, page, total).map(JewelryResponse::from))
    }

    async fn search(
        &self,
        term: Option<String>,
        page: PaginationParams,
    ) -> AppResult<Page<JewelryResponse>> {
        let term = term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::bad_request("Search query is required"))?;

        let (rows, total) = self.store.jewelry().search(term, page).await?;
        Ok(Page::new(rows, page, total).map(JewelryResponse::from))
    }

    async fn by_category(
        &self,
        category: Category,
        sort: CatalogSort,
        page: PaginationParams,
    ) -> AppResult<Page<JewelryResponse>> {
        self.list(CatalogFilter::for_category(category), sort, page)
            .await
    }

    async fn featured(&self) -> AppResult<Vec<JewelryResponse>> {
        let rows = self.store.jewelry().featured(FEATURED_LIMIT).await?;
        Ok(rows.into_iter().map(JewelryResponse::from).collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<JewelryResponse> {
        let row = self
            .store
            .jewelry()
            .find_by_id(id)
            .await?
            .filter(|row| row.item.is_active)
            .ok_or_not_found(ITEM)?;
        Ok(row.into())
    }

    async fn stats(&self) -> AppResult<CatalogStats> {
        self.store.jewelry().catalog_stats().await
    }

    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let repo = self.store.jewelry();
        let (overview, category_stats, material_stats) = tokio::try_join!(
            repo.dashboard_overview(),
            repo.group_stats(StatGroup::Category),
            repo.group_stats(StatGroup::Material),
        )?;

        Ok(DashboardStats {
            overview,
            category_stats,
            material_stats,
        })
    }

    async fn list_all(&self) -> AppResult<Vec<JewelryResponse>> {
        let rows = self.store.jewelry().list_all().await?;
        Ok(rows.into_iter().map(JewelryResponse::from).collect())
    }

    async fn create(&self, item: NewJewelry, owner: Uuid) -> AppResult<JewelryResponse> {
        let item = item.normalized()?.into_jewelry(owner);
        let created = self.store.jewelry().insert(item).await?;
        Ok(created.into())
    }

    async fn update(&self, id: Uuid, update: JewelryUpdate) -> AppResult<JewelryResponse> {
        let repo = self.store.jewelry();
        let mut item = repo.find_item(id).await?.ok_or_not_found(ITEM)?;

        update.apply(&mut item)?;
        item.updated_at = Utc::now();

        let saved = repo.save(item).await?;
        tracing::info!(jewelry_id = %saved.id, "Jewelry updated");
        Ok(saved.into())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.jewelry().delete(id).await? {
            return Err(AppError::not_found(ITEM));
        }
        tracing::info!(jewelry_id = %id, "Jewelry deleted");
        Ok(())
    }

    async fn toggle_status(&self, id: Uuid) -> AppResult<JewelryResponse> {
        let repo = self.store.jewelry();
        let mut item = repo.find_item(id).await?.ok_or_not_found(ITEM)?;
        let active = item.toggle_active();

        let saved = repo.save(item).await?;
        tracing::info!(jewelry_id = %saved.id, active, "Jewelry status toggled");
        Ok(saved.into())
    }
}
