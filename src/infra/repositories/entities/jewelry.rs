//! Jewelry database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Dimensions, ImageRef, Jewelry};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "jewelry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub gender: String,
    pub material: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    #[sea_orm(column_type = "Double", nullable)]
    pub weight: Option<f64>,
    pub weight_unit: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub dimensions: Option<Json>,
    pub in_stock: bool,
    pub featured: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn corrupt(field: &str, err: impl std::fmt::Display) -> AppError {
    AppError::internal(format!("Stored jewelry {} is invalid: {}", field, err))
}

impl TryFrom<Model> for Jewelry {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let images: Vec<ImageRef> =
            serde_json::from_value(model.images).map_err(|e| corrupt("images", e))?;
        let tags: Vec<String> =
            serde_json::from_value(model.tags).map_err(|e| corrupt("tags", e))?;
        let dimensions: Option<Dimensions> = model
            .dimensions
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| corrupt("dimensions", e))?;

        Ok(Jewelry {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category.parse()?,
            subcategory: model.subcategory.parse()?,
            gender: model.gender.parse()?,
            material: model.material.parse()?,
            images,
            price: model.price,
            weight: model.weight,
            weight_unit: model.weight_unit.parse()?,
            dimensions,
            in_stock: model.in_stock,
            featured: model.featured,
            tags,
            created_by: model.created_by,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<Jewelry> for ActiveModel {
    type Error = AppError;

    fn try_from(item: Jewelry) -> Result<Self, Self::Error> {
        let to_json = |field: &str, value: serde_json::Result<Json>| {
            value.map_err(|e| corrupt(field, e))
        };

        Ok(ActiveModel {
            id: Set(item.id),
            name: Set(item.name),
            description: Set(item.description),
            category: Set(item.category.to_string()),
            subcategory: Set(item.subcategory.to_string()),
            gender: Set(item.gender.to_string()),
            material: Set(item.material.to_string()),
            images: Set(to_json("images", serde_json::to_value(&item.images))?),
            price: Set(item.price),
            weight: Set(item.weight),
            weight_unit: Set(item.weight_unit.to_string()),
            dimensions: Set(item
                .dimensions
                .as_ref()
                .map(|d| to_json("dimensions", serde_json::to_value(d)))
                .transpose()?),
            in_stock: Set(item.in_stock),
            featured: Set(item.featured),
            tags: Set(to_json("tags", serde_json::to_value(&item.tags))?),
            created_by: Set(item.created_by),
            is_active: Set(item.is_active),
            created_at: Set(item.created_at),
            updated_at: Set(item.updated_at),
        })
    }
}
