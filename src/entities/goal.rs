//! Goal entity - a savings target with tracked progress.
//!
//! `status` is never written directly; it is recomputed from the amounts by
//! `core::goal::recompute_goal_status` on every mutation path.

use super::kinds::GoalStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Goal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Goal name (e.g., "Emergency fund")
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Amount to reach
    pub target_amount: f64,
    /// Amount saved so far
    pub current_amount: f64,
    /// Derived completion state
    pub status: GoalStatus,
    /// Optional deadline
    pub target_date: Option<DateTimeUtc>,
    /// Optional category the goal is tied to
    pub category_id: Option<i64>,
    /// Owner of the goal
    pub user_id: i64,
    /// When the goal was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Goal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each goal may belong to one category
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
