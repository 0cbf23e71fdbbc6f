//! Achievement awarding.
//!
//! Achievements are one-time: the `(user_id, name)` pair is unique, so granting
//! the same name twice is a no-op and never pays XP twice. The built-in awards
//! are listed in [`AchievementCode`] so their names cannot drift.

use crate::{
    core::{
        ledger,
        progress::{self, MAX_WRITE_ATTEMPTS, ProgressState},
    },
    entities::{Achievement, AchievementType, achievement},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything needed to grant one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementGrant {
    /// Achievement family
    pub achievement_type: AchievementType,
    /// Stable name, unique per user
    pub name: String,
    /// Text shown to the user
    pub description: String,
    /// XP paid out when first earned
    pub xp: i64,
}

/// Achievements granted by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementCode {
    /// First saving transaction
    FirstSaver,
    /// Three saving days in a row
    SavingSpree,
    /// Seven saving days in a row
    WeeklySaver,
    /// Thirty saving days in a row
    SavingChampion,
}

impl AchievementCode {
    /// Stored name of the achievement.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstSaver => "First Saver",
            Self::SavingSpree => "Saving Spree",
            Self::WeeklySaver => "Weekly Saver",
            Self::SavingChampion => "Saving Champion",
        }
    }

    /// The grant this code stands for.
    #[must_use]
    pub fn grant(self) -> AchievementGrant {
        let (achievement_type, description, xp) = match self {
            Self::FirstSaver => (
                AchievementType::FirstTransaction,
                "Made your first saving transaction",
                20,
            ),
            Self::SavingSpree => (
                AchievementType::SavingStreak,
                "3-day saving streak achieved",
                30,
            ),
            Self::WeeklySaver => (
                AchievementType::SavingStreak,
                "7-day saving streak achieved",
                75,
            ),
            Self::SavingChampion => (
                AchievementType::SavingStreak,
                "30-day saving streak achieved",
                300,
            ),
        };
        AchievementGrant {
            achievement_type,
            name: self.name().to_string(),
            description: description.to_string(),
            xp,
        }
    }

    /// The streak milestone reached at exactly `streak` days, if any.
    #[must_use]
    pub const fn for_streak(streak: i64) -> Option<Self> {
        match streak {
            3 => Some(Self::SavingSpree),
            7 => Some(Self::WeeklySaver),
            30 => Some(Self::SavingChampion),
            _ => None,
        }
    }
}

/// Inserts the achievement unless the user already holds one with that name.
///
/// Returns the new record, or `None` when it was already earned.
pub async fn insert_if_absent<C>(
    db: &C,
    user_id: i64,
    grant: &AchievementGrant,
) -> Result<Option<achievement::Model>>
where
    C: ConnectionTrait,
{
    let existing = Achievement::find()
        .filter(achievement::Column::UserId.eq(user_id))
        .filter(achievement::Column::Name.eq(grant.name.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let record = achievement::ActiveModel {
        user_id: Set(user_id),
        name: Set(grant.name.clone()),
        description: Set(grant.description.clone()),
        achievement_type: Set(grant.achievement_type),
        points_awarded: Set(grant.xp),
        earned_at: Set(Utc::now()),
        ..Default::default()
    };

    match record.insert(db).await {
        Ok(model) => Ok(Some(model)),
        // Lost a race against another grant of the same name
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Grants an achievement and its XP to `user_id`.
///
/// Returns `false` without side effects when the user already holds an
/// achievement with the same name. The record and the XP are written in one
/// database transaction.
pub async fn award_achievement(
    db: &DatabaseConnection,
    user_id: i64,
    grant: &AchievementGrant,
) -> Result<bool> {
    ledger::find_user(db, user_id).await?;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let txn = db.begin().await?;
        progress::lock_progress(&txn, user_id).await?;

        let Some(record) = insert_if_absent(&txn, user_id, grant).await? else {
            txn.rollback().await?;
            debug!(user_id, name = %grant.name, "Achievement already earned");
            return Ok(false);
        };

        let row = progress::load_or_create(&txn, user_id).await?;
        let mut state = ProgressState::from(&row);
        state.add_xp(grant.xp);

        if progress::save_progress(&txn, &row, &state).await? {
            txn.commit().await?;
            info!(
                user_id,
                name = %record.name,
                xp = grant.xp,
                level = state.level,
                "Achievement awarded"
            );
            return Ok(true);
        }

        txn.rollback().await?;
        debug!(user_id, attempt, "Progress changed concurrently, retrying award");
        progress::retry_backoff(attempt).await;
    }

    Err(Error::Conflict {
        message: format!("progress of user {user_id}"),
    })
}

/// Achievements of `user_id`, most recent first.
pub async fn get_user_achievements(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<achievement::Model>> {
    ledger::find_user(db, user_id).await?;
    Achievement::find()
        .filter(achievement::Column::UserId.eq(user_id))
        .order_by_desc(achievement::Column::EarnedAt)
        .order_by_desc(achievement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
