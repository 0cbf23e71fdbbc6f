//! Progress tracking - XP, levels and saving streaks.
//!
//! [`ProgressState`] is the pure state machine; the functions below it load and
//! persist the per-user row. Rows are created lazily with an insert that ignores
//! a conflicting `user_id`, and every write is a compare-and-swap on `version`.

use crate::{
    core::{aggregate::percentage, ledger},
    entities::{UserProgress, user_progress},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Level every user starts at.
pub const STARTING_LEVEL: i64 = 1;

/// XP threshold of the starting level.
pub const STARTING_THRESHOLD: i64 = 100;

/// How often a compare-and-swap write is retried before giving up.
pub const MAX_WRITE_ATTEMPTS: u32 = 10;

/// XP needed to leave `level`: 100 at level 1, then 50 more per level.
#[must_use]
pub const fn threshold_for_level(level: i64) -> i64 {
    STARTING_THRESHOLD + (level - STARTING_LEVEL) * 50
}

/// In-memory XP, level and streak of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    /// XP collected towards the next level
    pub current_xp: i64,
    /// Current level
    pub level: i64,
    /// XP needed to reach the next level
    pub xp_to_next_level: i64,
    /// Consecutive saving days
    pub saving_streak: i64,
    /// Moment of the last streak-advancing transaction
    pub last_saving_date: Option<DateTime<Utc>>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            current_xp: 0,
            level: STARTING_LEVEL,
            xp_to_next_level: STARTING_THRESHOLD,
            saving_streak: 0,
            last_saving_date: None,
        }
    }
}

impl From<&user_progress::Model> for ProgressState {
    fn from(row: &user_progress::Model) -> Self {
        Self {
            current_xp: row.current_xp,
            level: row.level,
            xp_to_next_level: row.xp_to_next_level,
            saving_streak: row.saving_streak,
            last_saving_date: row.last_saving_date,
        }
    }
}

impl ProgressState {
    /// Adds XP and levels up as many times as the total allows.
    ///
    /// Each level-up consumes the threshold of the level being left and moves
    /// on to the threshold of the new level.
    pub fn add_xp(&mut self, amount: i64) {
        self.current_xp += amount;
        while self.xp_to_next_level > 0 && self.current_xp >= self.xp_to_next_level {
            self.current_xp -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = threshold_for_level(self.level);
        }
    }

    /// Advances the streak if `at` falls on a later calendar day than the last saving.
    ///
    /// Returns whether the streak moved.
    pub fn update_saving_streak(&mut self, at: DateTime<Utc>) -> bool {
        let advances = self
            .last_saving_date
            .is_none_or(|last| at.date_naive() > last.date_naive());
        if advances {
            self.saving_streak += 1;
            self.last_saving_date = Some(at);
        }
        advances
    }

    /// Sets the streak back to zero, keeping the last saving date.
    pub const fn reset_saving_streak(&mut self) {
        self.saving_streak = 0;
    }

    /// Share of the current level already earned, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percentage(&self) -> f64 {
        percentage(self.current_xp as f64, self.xp_to_next_level as f64)
    }
}

/// Progress as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    /// Owner id
    pub user_id: i64,
    /// XP collected towards the next level
    pub current_xp: i64,
    /// Current level
    pub level: i64,
    /// XP needed to reach the next level
    pub xp_to_next_level: i64,
    /// Consecutive saving days
    pub saving_streak: i64,
    /// Moment of the last streak-advancing transaction
    pub last_saving_date: Option<DateTime<Utc>>,
    /// Share of the current level already earned, in percent
    pub progress_percentage: f64,
}

impl From<&user_progress::Model> for ProgressView {
    fn from(row: &user_progress::Model) -> Self {
        let state = ProgressState::from(row);
        Self {
            user_id: row.user_id,
            current_xp: state.current_xp,
            level: state.level,
            xp_to_next_level: state.xp_to_next_level,
            saving_streak: state.saving_streak,
            last_saving_date: state.last_saving_date,
            progress_percentage: state.progress_percentage(),
        }
    }
}

/// Returns the progress row of `user_id`, creating the default one if missing.
///
/// Safe to race: a concurrent creator makes the insert a no-op and both callers
/// read the same row.
pub async fn load_or_create<C>(db: &C, user_id: i64) -> Result<user_progress::Model>
where
    C: ConnectionTrait,
{
    if let Some(row) = find_progress(db, user_id).await? {
        return Ok(row);
    }

    let defaults = ProgressState::default();
    let row = user_progress::ActiveModel {
        user_id: Set(user_id),
        current_xp: Set(defaults.current_xp),
        level: Set(defaults.level),
        xp_to_next_level: Set(defaults.xp_to_next_level),
        saving_streak: Set(defaults.saving_streak),
        last_saving_date: Set(defaults.last_saving_date),
        version: Set(0),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    UserProgress::insert(row)
        .on_conflict(
            OnConflict::column(user_progress::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_progress(db, user_id).await?.ok_or(Error::NotFound {
        entity: "user progress",
        id: user_id,
    })
}

async fn find_progress<C>(db: &C, user_id: i64) -> Result<Option<user_progress::Model>>
where
    C: ConnectionTrait,
{
    UserProgress::find()
        .filter(user_progress::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Opens the write side of the surrounding database transaction on `user_id`'s row.
///
/// Must be the first statement of a progress transaction. `SQLite` then queues
/// concurrent writers on its busy timeout instead of failing a transaction whose
/// earlier reads went stale.
pub async fn lock_progress<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    UserProgress::update_many()
        .col_expr(
            user_progress::Column::Version,
            Expr::col(user_progress::Column::Version).into(),
        )
        .filter(user_progress::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Writes `state` over `row` if nobody else wrote it since it was read.
///
/// Returns `false` when the stored version moved on; the caller should reload
/// and retry.
pub async fn save_progress<C>(db: &C, row: &user_progress::Model, state: &ProgressState) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = UserProgress::update_many()
        .col_expr(user_progress::Column::CurrentXp, Expr::value(state.current_xp))
        .col_expr(user_progress::Column::Level, Expr::value(state.level))
        .col_expr(
            user_progress::Column::XpToNextLevel,
            Expr::value(state.xp_to_next_level),
        )
        .col_expr(
            user_progress::Column::SavingStreak,
            Expr::value(state.saving_streak),
        )
        .col_expr(
            user_progress::Column::LastSavingDate,
            Expr::value(state.last_saving_date),
        )
        .col_expr(user_progress::Column::Version, Expr::value(row.version + 1))
        .col_expr(user_progress::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(user_progress::Column::Id.eq(row.id))
        .filter(user_progress::Column::Version.eq(row.version))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Waits a little longer after each lost compare-and-swap so racing writers spread out.
pub async fn retry_backoff(attempt: u32) {
    tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 5)).await;
}

/// Creates the default progress of `user_id` if it does not exist yet.
pub async fn initialize_user_progress(db: &DatabaseConnection, user_id: i64) -> Result<ProgressView> {
    ledger::find_user(db, user_id).await?;
    let row = load_or_create(db, user_id).await?;
    Ok(ProgressView::from(&row))
}

/// Current progress of `user_id`; a user without activity starts at level 1.
pub async fn get_user_progress(db: &DatabaseConnection, user_id: i64) -> Result<ProgressView> {
    ledger::find_user(db, user_id).await?;
    let row = load_or_create(db, user_id).await?;
    Ok(ProgressView::from(&row))
}
