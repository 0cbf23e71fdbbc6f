//! Recurring transaction entity - a template the daily materializer expands.
//!
//! A rule is due when it is active, its `day_of_month` matches today, it has
//! started and not yet ended. `last_fired_on` records the calendar day the rule
//! last produced a transaction so a second run on the same day is a no-op.

use super::kinds::{RecurrenceType, TransactionKind};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Amount copied onto each materialized transaction
    pub amount: f64,
    /// Description copied (with an automation suffix) onto each transaction
    pub description: String,
    /// Category copied onto each transaction
    pub category_id: i64,
    /// Kind copied onto each transaction
    pub kind: TransactionKind,
    /// Day of month (1-31) on which the rule fires
    pub day_of_month: i32,
    /// First moment the rule may fire
    pub start_date: DateTimeUtc,
    /// Last moment the rule may fire, open-ended when `None`
    pub end_date: Option<DateTimeUtc>,
    /// Cadence label
    pub recurrence_type: RecurrenceType,
    /// Paused rules never fire
    pub active: bool,
    /// Owner of the rule and of every transaction it produces
    pub user_id: i64,
    /// Calendar day (UTC) of the most recent materialization
    pub last_fired_on: Option<Date>,
    /// When the rule was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `RecurringTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each rule belongs to one category
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
