//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity`, so the schema always
//! matches the entity definitions without hand-written SQL. The one composite index
//! that entity attributes cannot express, the (user, name) uniqueness of achievements,
//! is built with `sea_query`.

use crate::entities::{
    Achievement, Budget, Category, Goal, RecurringTransaction, Transaction, User, UserProgress,
    achievement,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/ledger_quest.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory that must exist before `SQLite` can create the file at `database_url`.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For a file-backed `SQLite` URL the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    tracing::debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables (if missing) from the entity definitions.
///
/// Categories are created first so that the foreign keys of transactions, budgets,
/// goals and recurrence rules point at an existing table.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(Budget),
        schema.create_table_from_entity(Goal),
        schema.create_table_from_entity(RecurringTransaction),
        schema.create_table_from_entity(UserProgress),
        schema.create_table_from_entity(Achievement),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    let achievement_index = Index::create()
        .name("idx_achievements_user_name")
        .table(Achievement)
        .col(achievement::Column::UserId)
        .col(achievement::Column::Name)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&achievement_index)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AchievementModel, BudgetModel, CategoryModel, GoalModel, RecurringTransactionModel,
        TransactionModel, UserModel, UserProgressModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<BudgetModel> = Budget::find().limit(1).all(&db).await?;
        let _: Vec<GoalModel> = Goal::find().limit(1).all(&db).await?;
        let _: Vec<RecurringTransactionModel> =
            RecurringTransaction::find().limit(1).all(&db).await?;
        let _: Vec<UserProgressModel> = UserProgress::find().limit(1).all(&db).await?;
        let _: Vec<AchievementModel> = Achievement::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite://data/ledger_quest.sqlite?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite://local.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
    }

    #[test]
    fn test_database_url_has_default() {
        assert!(!get_database_url().is_empty());
    }
}
