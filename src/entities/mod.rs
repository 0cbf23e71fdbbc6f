//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the ledger tables and the per-user gamification state.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod achievement;
pub mod budget;
pub mod category;
pub mod goal;
pub mod kinds;
pub mod recurring_transaction;
pub mod transaction;
pub mod user;
pub mod user_progress;

// Re-export specific types to avoid conflicts
pub use achievement::{
    Column as AchievementColumn, Entity as Achievement, Model as AchievementModel,
};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use goal::{Column as GoalColumn, Entity as Goal, Model as GoalModel};
pub use kinds::{AchievementType, GoalStatus, RecurrenceType, TransactionKind};
pub use recurring_transaction::{
    Column as RecurringTransactionColumn, Entity as RecurringTransaction,
    Model as RecurringTransactionModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_progress::{
    Column as UserProgressColumn, Entity as UserProgress, Model as UserProgressModel,
};
