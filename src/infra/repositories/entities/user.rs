//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: Option<String>,
    #[sea_orm(unique)]
    pub firebase_uid: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub display_name: String,
    pub photo_url: String,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login: Option<DateTimeUtc>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::jewelry::Entity")]
    Jewelry,
}

impl Related<super::jewelry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Jewelry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            firebase_uid: model.firebase_uid,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            display_name: model.display_name,
            photo_url: model.photo_url,
            role: UserRole::from(model.role.as_str()),
            is_active: model.is_active,
            email_verified: model.email_verified,
            last_login: model.last_login,
            password_reset_token: model.password_reset_token,
            password_reset_expires: model.password_reset_expires,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Full active model for saving a domain user back.
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(user.id),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            firebase_uid: Set(user.firebase_uid),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            phone: Set(user.phone),
            display_name: Set(user.display_name),
            photo_url: Set(user.photo_url),
            role: Set(user.role.to_string()),
            is_active: Set(user.is_active),
            email_verified: Set(user.email_verified),
            last_login: Set(user.last_login),
            password_reset_token: Set(user.password_reset_token),
            password_reset_expires: Set(user.password_reset_expires),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
