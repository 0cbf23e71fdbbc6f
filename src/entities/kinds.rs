//! String-backed enums shared by several tables.
//!
//! Stored as their upper-case names so the database stays readable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of a transaction, category or recurrence rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money coming in (salary, freelance)
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Money going out (rent, food)
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// Moving money between accounts
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    /// Money set aside for future use
    #[sea_orm(string_value = "SAVINGS")]
    Savings,
    /// Stocks, crypto, real estate
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    /// Loans and credit card payments
    #[sea_orm(string_value = "DEBT")]
    Debt,
}

/// Lifecycle of a savings goal. Always derived from the goal amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    /// Current amount is below target
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    /// Current amount reached or exceeded target
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

/// Cadence label of a recurrence rule.
///
/// Materialization is always driven by `day_of_month`; the label is informational.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceType {
    /// Weekly cadence
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    /// Monthly cadence
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
    /// Yearly cadence
    #[sea_orm(string_value = "YEARLY")]
    Yearly,
}

/// Family an achievement belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AchievementType {
    /// Consecutive days of saving
    #[sea_orm(string_value = "SAVING_STREAK")]
    SavingStreak,
    /// Staying within budget
    #[sea_orm(string_value = "BUDGET_ADHERENCE")]
    BudgetAdherence,
    /// Completing a financial goal
    #[sea_orm(string_value = "GOAL_COMPLETION")]
    GoalCompletion,
    /// Reducing expenses in a category
    #[sea_orm(string_value = "EXPENSE_REDUCTION")]
    ExpenseReduction,
    /// First qualifying transaction recorded
    #[sea_orm(string_value = "FIRST_TRANSACTION")]
    FirstTransaction,
    /// Reaching milestone amounts in savings
    #[sea_orm(string_value = "MILESTONE_SAVINGS")]
    MilestoneSavings,
    /// Regularly tracking expenses
    #[sea_orm(string_value = "CONSISTENT_TRACKING")]
    ConsistentTracking,
    /// Using all expense categories
    #[sea_orm(string_value = "CATEGORY_MASTER")]
    CategoryMaster,
}
