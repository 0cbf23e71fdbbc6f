//! Transaction creation - the entry point of the gamification event flow.
//!
//! Validation happens before anything is written: the amount must be positive
//! and finite, the owner and category must exist, and a private category may
//! only be used by its owner. Once the transaction is stored the progress
//! handler runs; its failure is logged and never undoes the transaction.

use crate::{
    core::{
        gamification,
        ledger::{self, LedgerEntry},
    },
    entities::{TransactionKind, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use tracing::{error, info};

/// Input for [`create_transaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Positive amount
    pub amount: f64,
    /// Free-text description
    pub description: String,
    /// Transaction kind
    pub kind: TransactionKind,
    /// Category to book against
    pub category_id: i64,
    /// When the transaction happened
    pub occurred_at: DateTime<Utc>,
}

/// Rejects zero, negative and non-finite amounts.
pub fn validate_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Stores a new transaction for `user_id` and feeds it to the progress tracker.
pub async fn create_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    new: NewTransaction,
) -> Result<LedgerEntry> {
    validate_amount(new.amount)?;

    ledger::find_user(db, user_id).await?;
    let category = ledger::find_category(db, new.category_id).await?;
    if !category.is_usable_by(user_id) {
        return Err(Error::Unauthorized {
            entity: "category",
            id: category.id,
        });
    }

    let model = transaction::ActiveModel {
        amount: Set(new.amount),
        description: Set(new.description),
        kind: Set(new.kind),
        category_id: Set(category.id),
        user_id: Set(user_id),
        occurred_at: Set(new.occurred_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        user_id,
        transaction_id = model.id,
        amount = model.amount,
        "Created transaction"
    );

    let entry = LedgerEntry {
        transaction: model,
        category: Some(category),
    };
    if let Err(e) = gamification::on_transaction_created(db, &entry).await {
        error!(
            user_id,
            transaction_id = entry.transaction.id,
            "Failed to update progress for transaction: {e}"
        );
    }

    Ok(entry)
}
