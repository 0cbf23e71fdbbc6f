//! Budget entity - a spending cap, optionally linked to one category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Budget name
    pub name: String,
    /// Budgeted amount for the period
    pub amount: f64,
    /// Category whose expenses count against this budget
    pub category_id: Option<i64>,
    /// Owner of the budget
    pub user_id: i64,
    /// When the budget was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget may track one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
