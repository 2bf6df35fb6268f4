//! Book entity model
//!
//! SeaORM entity for the books table. Keys are UUIDs chosen by the caller.

use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
use serde::{Deserialize, Serialize};

use crate::repositories::Include;

/// Book written by an author
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub author_id: i32,

    pub title: String,

    /// Page count
    pub pages: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::AuthorId",
        to = "super::author::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Joins the owning author so predicates may reference author columns.
pub fn join_author() -> Include<Entity> {
    Include::new("join_author", |query| {
        query.inner_join(super::author::Entity)
    })
}

/// Orders books by title, then by id for a stable result.
pub fn order_by_title() -> Include<Entity> {
    Include::new("order_by_title", |query| {
        query
            .order_by_asc(Column::Title)
            .order_by_asc(Column::Id)
    })
}
