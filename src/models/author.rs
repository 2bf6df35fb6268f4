//! Author entity model
//!
//! SeaORM entity for the authors table. The integer identity is generated by
//! the store on insert.

use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, QueryTrait};
use serde::{Deserialize, Serialize};

use crate::repositories::Include;

/// Author of one or more books
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    /// Store-generated identity (primary key)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique display name
    #[sea_orm(unique)]
    pub name: String,

    /// Contact address, if known
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book::Entity")]
    Books,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Orders authors alphabetically by name.
pub fn order_by_name() -> Include<Entity> {
    Include::new("order_by_name", |query| query.order_by_asc(Column::Name))
}

/// Restricts authors to those with at least one book.
///
/// Uses an `IN` subquery rather than a join, so each author appears once
/// and tracked reads can still lock the rows.
pub fn having_books() -> Include<Entity> {
    Include::new("having_books", |query| {
        query.filter(
            Column::Id.in_subquery(
                super::book::Entity::find()
                    .select_only()
                    .column(super::book::Column::AuthorId)
                    .into_query(),
            ),
        )
    })
}
