//! Jewelry catalog repository: filtered listing, text search and aggregates.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::entities::jewelry::{self, ActiveModel, Entity as JewelryEntity};
use super::entities::user::{self, Entity as UserEntity};
use crate::domain::{
    round_price, CatalogFilter, CatalogSort, CatalogStats, DashboardOverview, GroupStat, Jewelry,
    JewelryWithOwner, SortField, SortOrder,
};
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(test)]
use mockall::automock;

/// Full-text predicate against the generated `search_vector` column.
/// `$1` is built by [`any_term_query`].
const SEARCH_MATCH: &str = "search_vector @@ websearch_to_tsquery('english', $1)";
const SEARCH_RANK: &str = "ts_rank(search_vector, websearch_to_tsquery('english', $1))";

/// Rewrite free text so that an item matching any one word is a hit.
///
/// Words are split on anything that is not alphanumeric and joined with
/// `or`, which `websearch_to_tsquery` reads as a disjunction. Rank then
/// puts items matching more of the words first.
pub fn any_term_query(term: &str) -> String {
    term.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty() && !word.eq_ignore_ascii_case("or"))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Column a dashboard breakdown is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatGroup {
    Category,
    Material,
}

impl StatGroup {
    fn column(self) -> jewelry::Column {
        match self {
            StatGroup::Category => jewelry::Column::Category,
            StatGroup::Material => jewelry::Column::Material,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait JewelryRepository: Send + Sync {
    /// Item with its creator's display name, regardless of active state
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<JewelryWithOwner>>;

    /// Item without the owner join, for updates
    async fn find_item(&self, id: Uuid) -> AppResult<Option<Jewelry>>;

    /// One page of items matching `filter` plus the total match count
    async fn page(
        &self,
        filter: &CatalogFilter,
        sort: CatalogSort,
        page: PaginationParams,
    ) -> AppResult<(Vec<JewelryWithOwner>, u64)>;

    /// Active items matching `term`, most relevant first
    async fn search(
        &self,
        term: &str,
        page: PaginationParams,
    ) -> AppResult<(Vec<JewelryWithOwner>, u64)>;

    /// Newest featured active items
    async fn featured(&self, limit: u64) -> AppResult<Vec<JewelryWithOwner>>;

    /// Every item including inactive ones, newest first
    async fn list_all(&self) -> AppResult<Vec<JewelryWithOwner>>;

    async fn insert(&self, item: Jewelry) -> AppResult<Jewelry>;

    async fn save(&self, item: Jewelry) -> AppResult<Jewelry>;

    /// Returns false when no row matched
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Aggregates over active items
    async fn catalog_stats(&self) -> AppResult<CatalogStats>;

    /// Totals over all items
    async fn dashboard_overview(&self) -> AppResult<DashboardOverview>;

    /// Count and average price per group over active items, largest first
    async fn group_stats(&self, group: StatGroup) -> AppResult<Vec<GroupStat>>;
}

/// Build the WHERE clause for a catalog filter.
pub fn catalog_condition(filter: &CatalogFilter) -> Condition {
    let mut condition = Condition::all();

    if filter.active_only {
        condition = condition.add(jewelry::Column::IsActive.eq(true));
    }
    if let Some(category) = filter.category {
        condition = condition.add(jewelry::Column::Category.eq(category.as_str()));
    }
    if let Some(subcategory) = filter.subcategory {
        condition = condition.add(jewelry::Column::Subcategory.eq(subcategory.as_str()));
    }
    if let Some(gender) = filter.gender {
        condition = condition.add(jewelry::Column::Gender.eq(gender.as_str()));
    }
    if let Some(material) = filter.material {
        condition = condition.add(jewelry::Column::Material.eq(material.as_str()));
    }
    if filter.featured_only {
        condition = condition.add(jewelry::Column::Featured.eq(true));
    }
    if let Some(min) = filter.min_price {
        condition = condition.add(jewelry::Column::Price.gte(min));
    }
    if let Some(max) = filter.max_price {
        condition = condition.add(jewelry::Column::Price.lte(max));
    }
    if let Some(term) = &filter.search {
        condition = condition.add(Expr::cust_with_values(
            SEARCH_MATCH,
            [any_term_query(term)],
        ));
    }

    condition
}

fn sort_column(field: SortField) -> jewelry::Column {
    match field {
        SortField::CreatedAt => jewelry::Column::CreatedAt,
        SortField::UpdatedAt => jewelry::Column::UpdatedAt,
        SortField::Price => jewelry::Column::Price,
        SortField::Name => jewelry::Column::Name,
    }
}

fn sort_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

fn with_owners(
    rows: Vec<(jewelry::Model, Option<user::Model>)>,
) -> AppResult<Vec<JewelryWithOwner>> {
    rows.into_iter()
        .map(|(model, owner)| {
            Ok(JewelryWithOwner {
                item: Jewelry::try_from(model)?,
                owner_name: owner.map(|o| o.display_name),
            })
        })
        .collect()
}

#[derive(Debug, FromQueryResult)]
struct CatalogStatsRow {
    total_items: i64,
    total_categories: i64,
    total_materials: i64,
    avg_price: Option<f64>,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct OverviewRow {
    total_items: i64,
    active_items: i64,
    featured_items: i64,
    total_value: f64,
    avg_price: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct GroupRow {
    key: String,
    count: i64,
    avg_price: Option<f64>,
}

/// SeaORM-backed jewelry repository
pub struct JewelryStore {
    db: DatabaseConnection,
}

impl JewelryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JewelryRepository for JewelryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<JewelryWithOwner>> {
        let row = JewelryEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await?;

        Ok(with_owners(row.into_iter().collect())?.pop())
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<Jewelry>> {
        JewelryEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Jewelry::try_from)
            .transpose()
    }

    async fn page(
        &self,
        filter: &CatalogFilter,
        sort: CatalogSort,
        page: PaginationParams,
    ) -> AppResult<(Vec<JewelryWithOwner>, u64)> {
        let condition = catalog_condition(filter);

        let rows = JewelryEntity::find()
            .filter(condition.clone())
            .find_also_related(UserEntity)
            .order_by(sort_column(sort.field), sort_order(sort.order))
            .order_by_asc(jewelry::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db);
        let total = JewelryEntity::find().filter(condition).count(&self.db);

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok((with_owners(rows)?, total))
    }

    async fn search(
        &self,
        term: &str,
        page: PaginationParams,
    ) -> AppResult<(Vec<JewelryWithOwner>, u64)> {
        let condition = catalog_condition(&CatalogFilter {
            search: Some(term.to_string()),
            ..CatalogFilter::active()
        });

        let rows = JewelryEntity::find()
            .filter(condition.clone())
            .find_also_related(UserEntity)
            .order_by(
                Expr::cust_with_values(SEARCH_RANK, [any_term_query(term)]),
                Order::Desc,
            )
            .order_by_desc(jewelry::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db);
        let total = JewelryEntity::find().filter(condition).count(&self.db);

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok((with_owners(rows)?, total))
    }

    async fn featured(&self, limit: u64) -> AppResult<Vec<JewelryWithOwner>> {
        let filter = CatalogFilter {
            featured_only: true,
            ..CatalogFilter::active()
        };
        let rows = JewelryEntity::find()
            .filter(catalog_condition(&filter))
            .find_also_related(UserEntity)
            .order_by_desc(jewelry::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        with_owners(rows)
    }

    async fn list_all(&self) -> AppResult<Vec<JewelryWithOwner>> {
        let rows = JewelryEntity::find()
            .find_also_related(UserEntity)
            .order_by_desc(jewelry::Column::CreatedAt)
            .all(&self.db)
            .await?;
        with_owners(rows)
    }

    async fn insert(&self, item: Jewelry) -> AppResult<Jewelry> {
        let model = ActiveModel::try_from(item)?.insert(&self.db).await?;
        tracing::info!(jewelry_id = %model.id, "Jewelry created");
        Jewelry::try_from(model)
    }

    async fn save(&self, item: Jewelry) -> AppResult<Jewelry> {
        let model = ActiveModel::try_from(item)?.update(&self.db).await?;
        Jewelry::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = JewelryEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn catalog_stats(&self) -> AppResult<CatalogStats> {
        let row = JewelryEntity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(*)"), "total_items")
            .column_as(Expr::cust("COUNT(DISTINCT category)"), "total_categories")
            .column_as(Expr::cust("COUNT(DISTINCT material)"), "total_materials")
            .column_as(Expr::cust("AVG(price)"), "avg_price")
            .column_as(Expr::cust("MIN(price)"), "min_price")
            .column_as(Expr::cust("MAX(price)"), "max_price")
            .filter(jewelry::Column::IsActive.eq(true))
            .into_model::<CatalogStatsRow>()
            .one(&self.db)
            .await?;

        Ok(row
            .map(|r| CatalogStats {
                total_items: r.total_items as u64,
                total_categories: r.total_categories as u64,
                total_materials: r.total_materials as u64,
                avg_price: r.avg_price.map(round_price),
                min_price: r.min_price,
                max_price: r.max_price,
            })
            .unwrap_or_default())
    }

    async fn dashboard_overview(&self) -> AppResult<DashboardOverview> {
        let row = JewelryEntity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(*)"), "total_items")
            .column_as(
                Expr::cust("COUNT(*) FILTER (WHERE is_active)"),
                "active_items",
            )
            .column_as(
                Expr::cust("COUNT(*) FILTER (WHERE featured)"),
                "featured_items",
            )
            .column_as(Expr::cust("COALESCE(SUM(price), 0)"), "total_value")
            .column_as(Expr::cust("AVG(price)"), "avg_price")
            .into_model::<OverviewRow>()
            .one(&self.db)
            .await?;

        Ok(row
            .map(|r| DashboardOverview {
                total_items: r.total_items as u64,
                active_items: r.active_items as u64,
                featured_items: r.featured_items as u64,
                total_value: r.total_value,
                avg_price: r.avg_price,
            })
            .unwrap_or_default())
    }

    async fn group_stats(&self, group: StatGroup) -> AppResult<Vec<GroupStat>> {
        let column = group.column();
        let rows = JewelryEntity::find()
            .select_only()
            .column_as(column, "key")
            .column_as(Expr::cust("COUNT(*)"), "count")
            .column_as(Expr::cust("AVG(price)"), "avg_price")
            .filter(jewelry::Column::IsActive.eq(true))
            .group_by(column)
            .order_by_desc(Expr::cust("COUNT(*)"))
            .order_by_asc(column)
            .into_model::<GroupRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| GroupStat {
                key: r.key,
                count: r.count as u64,
                avg_price: r.avg_price,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Material};
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(filter: &CatalogFilter) -> String {
        JewelryEntity::find()
            .filter(catalog_condition(filter))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_default_filter_has_no_predicates() {
        let rendered = sql(&CatalogFilter::default());
        assert!(!rendered.contains("WHERE"));
    }

    #[test]
    fn test_active_filter() {
        let rendered = sql(&CatalogFilter::active());
        assert!(rendered.contains(r#""jewelry"."is_active" ="#));
    }

    #[test]
    fn test_enum_and_price_predicates() {
        let filter = CatalogFilter {
            category: Some(Category::Rings),
            material: Some(Material::RoseGold),
            min_price: Some(99.5),
            max_price: Some(500.25),
            ..CatalogFilter::active()
        };
        let rendered = sql(&filter);
        assert!(rendered.contains(r#""jewelry"."category" = 'rings'"#));
        assert!(rendered.contains(r#""jewelry"."material" = 'rose_gold'"#));
        assert!(rendered.contains(r#""jewelry"."price" >= 99.5"#));
        assert!(rendered.contains(r#""jewelry"."price" <= 500.25"#));
        assert!(!rendered.contains("featured"));
    }

    #[test]
    fn test_featured_and_search_predicates() {
        let filter = CatalogFilter {
            featured_only: true,
            search: Some("gold ring".to_string()),
            ..CatalogFilter::default()
        };
        let rendered = sql(&filter);
        assert!(rendered.contains(r#""jewelry"."featured" ="#));
        assert!(rendered.contains("search_vector @@ websearch_to_tsquery"));
        assert!(rendered.contains("'gold or ring'"));
    }

    #[test]
    fn test_search_matches_any_word() {
        assert_eq!(any_term_query("gold ring"), "gold or ring");
        assert_eq!(any_term_query("  Rose-gold,  pendant "), "Rose or gold or pendant");
        assert_eq!(any_term_query("silver OR chain"), "silver or chain");
        assert_eq!(any_term_query("\"quoted\" -minus"), "quoted or minus");
        assert_eq!(any_term_query("!!"), "");
    }

    #[test]
    fn test_search_rank_uses_same_query() {
        let rendered = JewelryEntity::find()
            .order_by(
                Expr::cust_with_values(SEARCH_RANK, [any_term_query("gold ring")]),
                Order::Desc,
            )
            .build(DbBackend::Postgres)
            .to_string();
        assert!(rendered
            .contains("ts_rank(search_vector, websearch_to_tsquery('english', 'gold or ring'))"));
    }

    #[test]
    fn test_sort_mapping() {
        assert!(matches!(sort_column(SortField::Price), jewelry::Column::Price));
        assert!(matches!(
            sort_column(SortField::CreatedAt),
            jewelry::Column::CreatedAt
        ));
        assert!(matches!(sort_order(SortOrder::Asc), Order::Asc));
    }
}
