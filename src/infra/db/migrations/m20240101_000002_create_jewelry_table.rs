//! Migration: Create jewelry catalog table with full-text search.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

/// Generated tsvector over name, description and tags, plus its GIN index.
const SEARCH_VECTOR_UP: &str = r#"
ALTER TABLE jewelry
    ADD COLUMN search_vector tsvector GENERATED ALWAYS AS (
        to_tsvector('english', coalesce(name, '') || ' ' || coalesce(description, ''))
        || to_tsvector('english', coalesce(tags, '[]'::jsonb))
    ) STORED;
CREATE INDEX IF NOT EXISTS idx_jewelry_search_vector ON jewelry USING GIN (search_vector);
"#;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jewelry::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jewelry::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Jewelry::Name).string().not_null())
                    .col(ColumnDef::new(Jewelry::Description).text().not_null())
                    .col(ColumnDef::new(Jewelry::Category).string_len(20).not_null())
                    .col(ColumnDef::new(Jewelry::Subcategory).string_len(20).not_null())
                    .col(ColumnDef::new(Jewelry::Gender).string_len(10).not_null())
                    .col(ColumnDef::new(Jewelry::Material).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Jewelry::Images)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Jewelry::Price).double().not_null())
                    .col(ColumnDef::new(Jewelry::Weight).double().null())
                    .col(
                        ColumnDef::new(Jewelry::WeightUnit)
                            .string_len(10)
                            .not_null()
                            .default("grams"),
                    )
                    .col(ColumnDef::new(Jewelry::Dimensions).json_binary().null())
                    .col(
                        ColumnDef::new(Jewelry::InStock)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Jewelry::Featured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Jewelry::Tags)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Jewelry::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Jewelry::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Jewelry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Jewelry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Jewelry::Price).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_jewelry_created_by")
                            .from(Jewelry::Table, Jewelry::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        let indexes = [
            Index::create()
                .name("idx_jewelry_category_subcategory")
                .table(Jewelry::Table)
                .col(Jewelry::Category)
                .col(Jewelry::Subcategory)
                .to_owned(),
            Index::create()
                .name("idx_jewelry_gender")
                .table(Jewelry::Table)
                .col(Jewelry::Gender)
                .to_owned(),
            Index::create()
                .name("idx_jewelry_material")
                .table(Jewelry::Table)
                .col(Jewelry::Material)
                .to_owned(),
            Index::create()
                .name("idx_jewelry_featured")
                .table(Jewelry::Table)
                .col(Jewelry::Featured)
                .to_owned(),
            Index::create()
                .name("idx_jewelry_in_stock")
                .table(Jewelry::Table)
                .col(Jewelry::InStock)
                .to_owned(),
            Index::create()
                .name("idx_jewelry_price")
                .table(Jewelry::Table)
                .col(Jewelry::Price)
                .to_owned(),
            Index::create()
                .name("idx_jewelry_created_at")
                .table(Jewelry::Table)
                .col((Jewelry::CreatedAt, IndexOrder::Desc))
                .to_owned(),
        ];

        for index in indexes {
            manager.create_index(index).await?;
        }

        manager
            .get_connection()
            .execute_unprepared(SEARCH_VECTOR_UP)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jewelry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Jewelry {
    Table,
    Id,
    Name,
    Description,
    Category,
    Subcategory,
    Gender,
    Material,
    Images,
    Price,
    Weight,
    WeightUnit,
    Dimensions,
    InStock,
    Featured,
    Tags,
    CreatedBy,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
