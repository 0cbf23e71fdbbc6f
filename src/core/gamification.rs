//! Transaction events - XP, saving streaks and streak achievements.
//!
//! Every new transaction is worth a flat amount of XP. Saving-like transactions
//! (income, or a category whose name mentions "saving") also drive the streak,
//! which can unlock the achievements in [`AchievementCode`].

use crate::{
    core::{
        achievement::{self, AchievementCode},
        ledger::LedgerEntry,
        progress::{self, MAX_WRITE_ATTEMPTS, ProgressState, ProgressView},
    },
    entities::TransactionKind,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, warn};

/// XP granted for logging any transaction.
pub const TRANSACTION_XP: i64 = 5;

/// What a transaction event changed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    /// Progress after the event
    pub progress: ProgressView,
    /// Achievements earned by this event
    pub awarded: Vec<AchievementCode>,
}

/// Whether the transaction counts towards the saving streak.
#[must_use]
pub fn is_saving_transaction(entry: &LedgerEntry) -> bool {
    entry.transaction.kind == TransactionKind::Income
        || entry
            .category
            .as_ref()
            .is_some_and(|category| category.name.to_lowercase().contains("saving"))
}

/// Applies a saving transaction at `at` to the streak.
///
/// Returns the achievements the event qualifies for. A transaction the day
/// after the last saving extends the streak, a longer gap restarts it at one,
/// and a same-day or older transaction leaves it alone.
pub fn apply_saving_event(state: &mut ProgressState, at: DateTime<Utc>) -> Vec<AchievementCode> {
    let Some(last) = state.last_saving_date else {
        state.update_saving_streak(at);
        return vec![AchievementCode::FirstSaver];
    };

    let days_between = (at.date_naive() - last.date_naive()).num_days();
    match days_between {
        1 => {
            state.update_saving_streak(at);
            AchievementCode::for_streak(state.saving_streak)
                .into_iter()
                .collect()
        }
        gap if gap > 1 => {
            state.reset_saving_streak();
            state.update_saving_streak(at);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Updates the owner's progress for a newly created transaction.
///
/// The progress row and any achievements are written in one database
/// transaction. A single achievement that cannot be stored is logged and
/// skipped; it does not block the XP or the other achievements.
pub async fn on_transaction_created(
    db: &DatabaseConnection,
    entry: &LedgerEntry,
) -> Result<EventOutcome> {
    let user_id = entry.transaction.user_id;
    let saving = is_saving_transaction(entry);

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let txn = db.begin().await?;
        progress::lock_progress(&txn, user_id).await?;
        let row = progress::load_or_create(&txn, user_id).await?;
        let mut state = ProgressState::from(&row);

        state.add_xp(TRANSACTION_XP);
        let candidates = if saving {
            apply_saving_event(&mut state, entry.transaction.occurred_at)
        } else {
            Vec::new()
        };

        let mut awarded = Vec::new();
        for code in candidates {
            let grant = code.grant();
            match achievement::insert_if_absent(&txn, user_id, &grant).await {
                Ok(Some(_)) => {
                    state.add_xp(grant.xp);
                    awarded.push(code);
                }
                Ok(None) => {}
                Err(e) => warn!(user_id, name = code.name(), "Failed to award achievement: {e}"),
            }
        }

        if progress::save_progress(&txn, &row, &state).await? {
            txn.commit().await?;
            for code in &awarded {
                info!(user_id, name = code.name(), "Achievement awarded");
            }
            let stored = progress::load_or_create(db, user_id).await?;
            return Ok(EventOutcome {
                progress: ProgressView::from(&stored),
                awarded,
            });
        }

        txn.rollback().await?;
        debug!(user_id, attempt, "Progress changed concurrently, retrying event");
        progress::retry_backoff(attempt).await;
    }

    Err(Error::Conflict {
        message: format!("progress of user {user_id}"),
    })
}
