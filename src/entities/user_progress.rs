//! User progress entity - per-user XP, level and saving streak.
//!
//! One row per user, created lazily. Writes go through a compare-and-swap on
//! `version` so concurrent transaction events cannot lose XP.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User progress database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_progress")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner; at most one progress row per user
    #[sea_orm(unique)]
    pub user_id: i64,
    /// XP collected towards the next level, always below `xp_to_next_level` at rest
    pub current_xp: i64,
    /// Current level, starting at 1
    pub level: i64,
    /// XP threshold of the current level
    pub xp_to_next_level: i64,
    /// Consecutive calendar days with a saving transaction
    pub saving_streak: i64,
    /// Moment of the last streak-advancing transaction
    pub last_saving_date: Option<DateTimeUtc>,
    /// Optimistic concurrency token, bumped on every write
    pub version: i64,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

/// `UserProgress` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
