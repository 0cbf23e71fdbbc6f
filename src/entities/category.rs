//! Category entity - shared by reference from transactions, budgets, goals and rules.
//!
//! A category with no `user_id` is a system category usable by everyone;
//! otherwise only its owner may attach it to new records.

use super::kinds::TransactionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Groceries", "Savings Account")
    #[sea_orm(unique)]
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Kind of money movement this category is meant for
    pub kind: TransactionKind,
    /// Owning user, `None` for shared system categories
    pub user_id: Option<i64>,
    /// When the category was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Whether `user_id` may reference this category.
    #[must_use]
    pub fn is_usable_by(&self, user_id: i64) -> bool {
        self.user_id.is_none_or(|owner| owner == user_id)
    }
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
