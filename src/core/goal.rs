//! Savings goals.
//!
//! A goal's status is derived: it is COMPLETED exactly when the current amount
//! reaches the target. [`recompute_goal_status`] is the single place that rule
//! lives, and every mutation below goes through it before writing.

use crate::{
    core::{ledger, transaction::validate_amount},
    entities::{Goal, GoalStatus, goal},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};

/// Status implied by the goal's amounts.
#[must_use]
pub fn goal_status_for(current_amount: f64, target_amount: f64) -> GoalStatus {
    if current_amount >= target_amount {
        GoalStatus::Completed
    } else {
        GoalStatus::InProgress
    }
}

/// Returns the goal with `status` brought in line with its amounts.
#[must_use]
pub fn recompute_goal_status(mut goal: goal::Model) -> goal::Model {
    goal.status = goal_status_for(goal.current_amount, goal.target_amount);
    goal
}

/// Input for [`create_goal`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    /// Goal name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Amount to reach, must be positive
    pub target_amount: f64,
    /// Amount already saved, must not be negative
    pub current_amount: f64,
    /// Optional deadline
    pub target_date: Option<DateTime<Utc>>,
    /// Optional linked category, must be usable by the owner
    pub category_id: Option<i64>,
}

/// Saved amounts may be zero but never negative.
fn validate_saved_amount(amount: f64) -> Result<()> {
    if amount == 0.0 {
        Ok(())
    } else {
        validate_amount(amount)
    }
}

async fn owned_goal<C>(db: &C, user_id: i64, goal_id: i64) -> Result<goal::Model>
where
    C: ConnectionTrait,
{
    let goal = Goal::find_by_id(goal_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "goal",
            id: goal_id,
        })?;
    if goal.user_id != user_id {
        return Err(Error::Unauthorized {
            entity: "goal",
            id: goal_id,
        });
    }
    Ok(goal)
}

async fn store_amount<C>(db: &C, goal: goal::Model, current_amount: f64) -> Result<goal::Model>
where
    C: ConnectionTrait,
{
    let updated = recompute_goal_status(goal::Model {
        current_amount,
        ..goal
    });
    let mut active: goal::ActiveModel = updated.clone().into();
    active.current_amount = Set(updated.current_amount);
    active.status = Set(updated.status);
    active.update(db).await.map_err(Into::into)
}

/// Creates a goal for `user_id`.
pub async fn create_goal(db: &DatabaseConnection, user_id: i64, new: NewGoal) -> Result<goal::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::InvalidState {
            message: "Goal name cannot be empty".to_string(),
        });
    }
    validate_amount(new.target_amount)?;
    validate_saved_amount(new.current_amount)?;

    ledger::find_user(db, user_id).await?;
    if let Some(category_id) = new.category_id {
        let category = ledger::find_category(db, category_id).await?;
        if !category.is_usable_by(user_id) {
            return Err(Error::Unauthorized {
                entity: "category",
                id: category_id,
            });
        }
    }

    let goal = goal::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        target_amount: Set(new.target_amount),
        current_amount: Set(new.current_amount),
        status: Set(goal_status_for(new.current_amount, new.target_amount)),
        target_date: Set(new.target_date),
        category_id: Set(new.category_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    goal.insert(db).await.map_err(Into::into)
}

/// Sets the saved amount of a goal owned by `user_id`.
pub async fn set_goal_amount(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
    current_amount: f64,
) -> Result<goal::Model> {
    validate_saved_amount(current_amount)?;
    let goal = owned_goal(db, user_id, goal_id).await?;
    store_amount(db, goal, current_amount).await
}

/// Adds `delta` (negative to withdraw) to the saved amount of a goal owned by `user_id`.
///
/// The amount never drops below zero.
pub async fn update_goal_progress(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
    delta: f64,
) -> Result<goal::Model> {
    if !delta.is_finite() {
        return Err(Error::InvalidAmount { amount: delta });
    }

    let txn = db.begin().await?;
    let goal = owned_goal(&txn, user_id, goal_id).await?;
    let current_amount = (goal.current_amount + delta).max(0.0);
    let updated = store_amount(&txn, goal, current_amount).await?;
    txn.commit().await?;
    Ok(updated)
}
