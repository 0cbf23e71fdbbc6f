//! Recurring transactions - rule management and the daily materializer.
//!
//! A rule fires on its day of month while it is active and within its start and
//! end dates. Each rule remembers the date it last fired on; the materializer
//! claims that date with a conditional update in the same database transaction
//! as the insert, so running the job twice on one day creates nothing new.

use crate::{
    core::{ledger, transaction::validate_amount},
    entities::{
        RecurrenceType, RecurringTransaction, TransactionKind, recurring_transaction, transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{Condition, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{debug, error, info};

/// Suffix appended to the description of materialized transactions.
pub const AUTOMATED_SUFFIX: &str = " (Automated)";

/// Input for [`create_recurring_transaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTransaction {
    /// Positive amount of each occurrence
    pub amount: f64,
    /// Description copied to each occurrence
    pub description: String,
    /// Category of each occurrence
    pub category_id: i64,
    /// Kind of each occurrence
    pub kind: TransactionKind,
    /// Day of month the rule fires on, 1 to 31
    pub day_of_month: u32,
    /// First moment the rule may fire
    pub start_date: DateTime<Utc>,
    /// Last moment the rule may fire, open-ended if `None`
    pub end_date: Option<DateTime<Utc>>,
    /// Declared cadence
    pub recurrence_type: RecurrenceType,
}

/// Result of one materializer run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurrenceRun {
    /// Calendar day the run covered
    pub date: NaiveDate,
    /// Transactions created by this run
    pub materialized: Vec<transaction::Model>,
    /// Due rules that had already fired today
    pub skipped: usize,
    /// Due rules that could not be materialized
    pub failed: usize,
}

async fn owned_rule(
    db: &DatabaseConnection,
    user_id: i64,
    rule_id: i64,
) -> Result<recurring_transaction::Model> {
    let rule = RecurringTransaction::find_by_id(rule_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "recurring transaction",
            id: rule_id,
        })?;
    if rule.user_id != user_id {
        return Err(Error::Unauthorized {
            entity: "recurring transaction",
            id: rule_id,
        });
    }
    Ok(rule)
}

/// Creates a rule for `user_id`.
pub async fn create_recurring_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    new: NewRecurringTransaction,
) -> Result<recurring_transaction::Model> {
    validate_amount(new.amount)?;
    if !(1..=31).contains(&new.day_of_month) {
        return Err(Error::InvalidState {
            message: format!("day of month must be between 1 and 31, got {}", new.day_of_month),
        });
    }
    if new.end_date.is_some_and(|end| end < new.start_date) {
        return Err(Error::InvalidState {
            message: "end date is before start date".to_string(),
        });
    }

    ledger::find_user(db, user_id).await?;
    let category = ledger::find_category(db, new.category_id).await?;
    if !category.is_usable_by(user_id) {
        return Err(Error::Unauthorized {
            entity: "category",
            id: category.id,
        });
    }

    let rule = recurring_transaction::ActiveModel {
        amount: Set(new.amount),
        description: Set(new.description),
        category_id: Set(category.id),
        kind: Set(new.kind),
        day_of_month: Set(i32::try_from(new.day_of_month)?),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        recurrence_type: Set(new.recurrence_type),
        active: Set(true),
        user_id: Set(user_id),
        last_fired_on: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    rule.insert(db).await.map_err(Into::into)
}

/// Activates or pauses a rule owned by `user_id`.
pub async fn set_recurring_active(
    db: &DatabaseConnection,
    user_id: i64,
    rule_id: i64,
    active: bool,
) -> Result<recurring_transaction::Model> {
    let rule = owned_rule(db, user_id, rule_id).await?;
    let mut rule: recurring_transaction::ActiveModel = rule.into();
    rule.active = Set(active);
    rule.update(db).await.map_err(Into::into)
}

/// Materializes one rule for `as_of`, or returns `None` if it already fired that day.
async fn materialize_rule(
    db: &DatabaseConnection,
    rule: &recurring_transaction::Model,
    as_of: DateTime<Utc>,
) -> Result<Option<transaction::Model>> {
    if !(rule.amount.is_finite() && rule.amount > 0.0) {
        return Err(Error::InvalidState {
            message: format!("rule {} has invalid amount {}", rule.id, rule.amount),
        });
    }

    let today = as_of.date_naive();
    let txn = db.begin().await?;

    let claimed = RecurringTransaction::update_many()
        .col_expr(recurring_transaction::Column::LastFiredOn, Expr::value(today))
        .filter(recurring_transaction::Column::Id.eq(rule.id))
        .filter(
            Condition::any()
                .add(recurring_transaction::Column::LastFiredOn.is_null())
                .add(recurring_transaction::Column::LastFiredOn.ne(today)),
        )
        .exec(&txn)
        .await?;
    if claimed.rows_affected == 0 {
        txn.rollback().await?;
        return Ok(None);
    }

    let created = transaction::ActiveModel {
        amount: Set(rule.amount),
        description: Set(format!("{}{AUTOMATED_SUFFIX}", rule.description)),
        kind: Set(rule.kind),
        category_id: Set(rule.category_id),
        user_id: Set(rule.user_id),
        occurred_at: Set(as_of),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(Some(created))
}

/// Creates the transactions of every rule due on the calendar day of `as_of`.
///
/// A failing rule is logged and counted; it never stops the others.
pub async fn run_daily_recurrence(
    db: &DatabaseConnection,
    as_of: DateTime<Utc>,
) -> Result<RecurrenceRun> {
    let rules = ledger::find_active_recurrence_rules(db, as_of.day(), as_of).await?;
    let mut run = RecurrenceRun {
        date: as_of.date_naive(),
        materialized: Vec::new(),
        skipped: 0,
        failed: 0,
    };

    for rule in &rules {
        match materialize_rule(db, rule, as_of).await {
            Ok(Some(created)) => {
                debug!(rule_id = rule.id, transaction_id = created.id, "Materialized rule");
                run.materialized.push(created);
            }
            Ok(None) => run.skipped += 1,
            Err(e) => {
                error!(rule_id = rule.id, user_id = rule.user_id, "Failed to materialize rule: {e}");
                run.failed += 1;
            }
        }
    }

    info!(
        date = %run.date,
        due = rules.len(),
        created = run.materialized.len(),
        skipped = run.skipped,
        failed = run.failed,
        "Daily recurrence finished"
    );
    Ok(run)
}
