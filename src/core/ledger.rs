//! Ledger store queries - the read side every analytics operation starts from.
//!
//! Queries are scoped either to one owner or to the whole system. Transactions are
//! always returned with their category joined and in a deterministic order
//! (`occurred_at`, then `id`) so that downstream rankings are stable.

use crate::{
    core::period::DateRange,
    entities::{
        Budget, Category, Goal, RecurringTransaction, Transaction, User, budget, category, goal,
        recurring_transaction, transaction, user,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, QuerySelect, prelude::*};

/// Label used in reports for transactions whose category cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Whose records a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Records owned by one user
    User(i64),
    /// Every record in the system
    System,
}

impl Scope {
    const fn owner(self) -> Option<i64> {
        match self {
            Self::User(id) => Some(id),
            Self::System => None,
        }
    }
}

/// A transaction together with its (possibly missing) category.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The transaction row
    pub transaction: transaction::Model,
    /// The category row, if it still resolves
    pub category: Option<category::Model>,
}

impl LedgerEntry {
    /// Category display name, or [`UNCATEGORIZED`].
    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map_or(UNCATEGORIZED, |category| category.name.as_str())
    }
}

impl From<(transaction::Model, Option<category::Model>)> for LedgerEntry {
    fn from((transaction, category): (transaction::Model, Option<category::Model>)) -> Self {
        Self {
            transaction,
            category,
        }
    }
}

/// Finds a user by id.
pub async fn find_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "user",
            id: user_id,
        })
}

/// Lists every user, oldest account first.
pub async fn find_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by id.
pub async fn find_category<C>(db: &C, category_id: i64) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "category",
            id: category_id,
        })
}

/// Lists every category ordered by id.
pub async fn find_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the transactions in `scope` that occurred within `range`.
pub async fn find_transactions(
    db: &DatabaseConnection,
    scope: Scope,
    range: DateRange,
) -> Result<Vec<LedgerEntry>> {
    let mut query = Transaction::find()
        .find_also_related(Category)
        .filter(transaction::Column::OccurredAt.between(range.start, range.end));
    if let Some(owner) = scope.owner() {
        query = query.filter(transaction::Column::UserId.eq(owner));
    }

    let rows = query
        .order_by_asc(transaction::Column::OccurredAt)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(LedgerEntry::from).collect())
}

/// Retrieves the `limit` most recently created transactions in `scope`, newest first.
pub async fn find_recent_transactions(
    db: &DatabaseConnection,
    scope: Scope,
    limit: u64,
) -> Result<Vec<LedgerEntry>> {
    let mut query = Transaction::find().find_also_related(Category);
    if let Some(owner) = scope.owner() {
        query = query.filter(transaction::Column::UserId.eq(owner));
    }

    let rows = query
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(LedgerEntry::from).collect())
}

/// Retrieves every budget in `scope`.
pub async fn find_budgets(db: &DatabaseConnection, scope: Scope) -> Result<Vec<budget::Model>> {
    let mut query = Budget::find();
    if let Some(owner) = scope.owner() {
        query = query.filter(budget::Column::UserId.eq(owner));
    }
    query
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every goal in `scope`.
pub async fn find_goals(db: &DatabaseConnection, scope: Scope) -> Result<Vec<goal::Model>> {
    let mut query = Goal::find();
    if let Some(owner) = scope.owner() {
        query = query.filter(goal::Column::UserId.eq(owner));
    }
    query
        .order_by_asc(goal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the `limit` most recently created goals in `scope`, newest first.
pub async fn find_recent_goals(
    db: &DatabaseConnection,
    scope: Scope,
    limit: u64,
) -> Result<Vec<goal::Model>> {
    let mut query = Goal::find();
    if let Some(owner) = scope.owner() {
        query = query.filter(goal::Column::UserId.eq(owner));
    }
    query
        .order_by_desc(goal::Column::CreatedAt)
        .order_by_desc(goal::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every recurrence rule in `scope`, active or not.
pub async fn find_recurring_rules(
    db: &DatabaseConnection,
    scope: Scope,
) -> Result<Vec<recurring_transaction::Model>> {
    let mut query = RecurringTransaction::find();
    if let Some(owner) = scope.owner() {
        query = query.filter(recurring_transaction::Column::UserId.eq(owner));
    }
    query
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the active rules due on `day_of_month` that have started by `as_of`.
///
/// The end date counts by calendar day: a rule ending at any time on `as_of`'s
/// UTC day still fires that day.
pub async fn find_active_recurrence_rules(
    db: &DatabaseConnection,
    day_of_month: u32,
    as_of: DateTime<Utc>,
) -> Result<Vec<recurring_transaction::Model>> {
    let day = i32::try_from(day_of_month)?;
    let day_start = as_of
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(as_of, |midnight| midnight.and_utc());
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::Active.eq(true))
        .filter(recurring_transaction::Column::DayOfMonth.eq(day))
        .filter(recurring_transaction::Column::StartDate.lte(as_of))
        .filter(
            Condition::any()
                .add(recurring_transaction::Column::EndDate.is_null())
                .add(recurring_transaction::Column::EndDate.gte(day_start)),
        )
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::TransactionKind;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_find_transactions_scopes_and_range() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let food = create_test_category(&db, "Food", TransactionKind::Expense, None).await?;

        insert_test_transaction(&db, alice.id, &food, 10.0, utc(2024, 3, 1)).await?;
        insert_test_transaction(&db, alice.id, &food, 20.0, utc(2024, 3, 20)).await?;
        insert_test_transaction(&db, bob.id, &food, 30.0, utc(2024, 3, 10)).await?;
        insert_test_transaction(&db, alice.id, &food, 40.0, utc(2023, 1, 1)).await?;

        let march = DateRange::new(utc(2024, 3, 1), utc(2024, 3, 31));
        let alice_entries = find_transactions(&db, Scope::User(alice.id), march).await?;
        let amounts: Vec<f64> = alice_entries.iter().map(|e| e.transaction.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0]);
        assert_eq!(alice_entries[0].category_name(), "Food");

        let everyone = find_transactions(&db, Scope::System, march).await?;
        let amounts: Vec<f64> = everyone.iter().map(|e| e.transaction.amount).collect();
        assert_eq!(amounts, vec![10.0, 30.0, 20.0]);

        Ok(())
    }

    #[tokio::test]
    async fn test_find_category_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = find_category(&db, 42).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "category",
                id: 42
            })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_category_is_uncategorized() {
        let entry = test_entry(TransactionKind::Expense, 5.0, None, utc(2024, 1, 1));
        assert_eq!(entry.category_name(), UNCATEGORIZED);
    }
}
