//! Transaction entity - immutable ledger records.
//!
//! Each transaction has a positive `amount`, a `kind`, a `category_id`, the owning
//! `user_id`, and the moment it occurred. Rows are created by users or by the
//! recurrence materializer and are never deleted automatically.
use super::kinds::TransactionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Transaction amount, always positive; direction comes from `kind`
    pub amount: f64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Kind of money movement
    pub kind: TransactionKind,
    /// Category this transaction is filed under
    pub category_id: i64,
    /// Owner of the transaction
    pub user_id: i64,
    /// When the money moved
    pub occurred_at: DateTimeUtc,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one category
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
