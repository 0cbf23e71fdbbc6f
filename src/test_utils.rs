//! Shared test utilities for `ledger-quest`.
//!
//! This module provides helpers for setting up an in-memory database and for
//! creating users, categories and ledger records with sensible defaults.

use crate::{
    core::ledger::LedgerEntry,
    entities::{
        RecurrenceType, TransactionKind, budget, category, goal, recurring_transaction,
        transaction, user,
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::path::PathBuf;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database in the temp directory.
///
/// Unlike the in-memory database this one is served by several pooled
/// connections, so concurrent writers really interleave. Any file left over from
/// an earlier run is removed first; the caller removes the returned path when done.
pub async fn setup_file_test_db(name: &str) -> Result<(DatabaseConnection, PathBuf)> {
    let path = std::env::temp_dir().join(format!("ledger_quest_{name}_{}.sqlite", std::process::id()));
    std::fs::remove_file(&path).ok();
    let db = sea_orm::Database::connect(format!("sqlite://{}?mode=rwc", path.display())).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, path))
}

/// Midnight UTC of the given day.
///
/// # Panics
/// Panics on an invalid date.
#[allow(clippy::unwrap_used)]
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Creates a user with the given email.
///
/// # Defaults
/// * `full_name`: the part of the email before `@`
/// * `created_at`: 2024-01-01
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    let full_name = email.split('@').next().unwrap_or(email).to_string();
    user::ActiveModel {
        email: Set(email.to_string()),
        full_name: Set(full_name),
        created_at: Set(utc(2024, 1, 1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a category; `owner` of `None` makes it shared.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    kind: TransactionKind,
    owner: Option<i64>,
) -> Result<category::Model> {
    category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        kind: Set(kind),
        user_id: Set(owner),
        created_at: Set(utc(2024, 1, 1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a transaction directly, without validation or progress events.
///
/// The transaction takes the kind of its category.
pub async fn insert_test_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    category: &category::Model,
    amount: f64,
    occurred_at: DateTime<Utc>,
) -> Result<LedgerEntry> {
    let model = transaction::ActiveModel {
        amount: Set(amount),
        description: Set(format!("{} payment", category.name)),
        kind: Set(category.kind),
        category_id: Set(category.id),
        user_id: Set(user_id),
        occurred_at: Set(occurred_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(LedgerEntry {
        transaction: model,
        category: Some(category.clone()),
    })
}

/// Creates a budget for `user_id`.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    user_id: i64,
    category_id: Option<i64>,
    amount: f64,
) -> Result<budget::Model> {
    budget::ActiveModel {
        name: Set("Test budget".to_string()),
        amount: Set(amount),
        category_id: Set(category_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a goal for `user_id` with its status derived from the amounts.
pub async fn create_test_goal(
    db: &DatabaseConnection,
    user_id: i64,
    target_amount: f64,
    current_amount: f64,
) -> Result<goal::Model> {
    goal::ActiveModel {
        name: Set("Test goal".to_string()),
        description: Set(None),
        target_amount: Set(target_amount),
        current_amount: Set(current_amount),
        status: Set(crate::core::goal::goal_status_for(
            current_amount,
            target_amount,
        )),
        target_date: Set(None),
        category_id: Set(None),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an active monthly rule starting 2024-01-01 with no end date.
///
/// The rule takes the kind of its category.
pub async fn create_test_rule(
    db: &DatabaseConnection,
    user_id: i64,
    category: &category::Model,
    amount: f64,
    day_of_month: i32,
) -> Result<recurring_transaction::Model> {
    recurring_transaction::ActiveModel {
        amount: Set(amount),
        description: Set(category.name.clone()),
        category_id: Set(category.id),
        kind: Set(category.kind),
        day_of_month: Set(day_of_month),
        start_date: Set(utc(2024, 1, 1)),
        end_date: Set(None),
        recurrence_type: Set(RecurrenceType::Monthly),
        active: Set(true),
        user_id: Set(user_id),
        last_fired_on: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// In-memory category model, never stored.
pub fn test_category(id: i64, name: &str, kind: TransactionKind) -> category::Model {
    category::Model {
        id,
        name: name.to_string(),
        description: None,
        kind,
        user_id: None,
        created_at: utc(2024, 1, 1),
    }
}

/// In-memory ledger entry, never stored.
///
/// A `category` of `None` models a transaction whose category no longer resolves.
pub fn test_entry(
    kind: TransactionKind,
    amount: f64,
    category: Option<&str>,
    occurred_at: DateTime<Utc>,
) -> LedgerEntry {
    LedgerEntry {
        transaction: transaction::Model {
            id: 0,
            amount,
            description: "test".to_string(),
            kind,
            category_id: 0,
            user_id: 1,
            occurred_at,
            created_at: occurred_at,
        },
        category: category.map(|name| test_category(0, name, kind)),
    }
}
