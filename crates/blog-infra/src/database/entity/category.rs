//! Category entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for blog_core::domain::Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            slug: model.slug,
            is_published: model.is_published,
            created_at: model.created_at.into(),
        }
    }
}

impl From<blog_core::domain::Category> for ActiveModel {
    fn from(category: blog_core::domain::Category) -> Self {
        Self {
            id: Set(category.id),
            title: Set(category.title),
            description: Set(category.description),
            slug: Set(category.slug),
            is_published: Set(category.is_published),
            created_at: Set(category.created_at.into()),
        }
    }
}
