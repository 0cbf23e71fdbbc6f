//! User entity - the minimal identity record needed for admin statistics.
//!
//! Authentication lives upstream; this table only maps an owner id to display data.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier, referenced as `user_id` by every owned record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub full_name: String,
    /// When the account was registered
    pub created_at: DateTimeUtc,
}

/// Users are referenced by plain `user_id` columns, not foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
