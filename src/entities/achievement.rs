//! Achievement entity - one-time awards, unique per (user, name).

use super::kinds::AchievementType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Achievement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient
    pub user_id: i64,
    /// Stable name, the idempotence key per user
    pub name: String,
    /// What the user did to earn it
    pub description: String,
    /// Achievement family
    pub achievement_type: AchievementType,
    /// XP granted when earned
    pub points_awarded: i64,
    /// When it was earned
    pub earned_at: DateTimeUtc,
}

/// `Achievement` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
