//! Unified error type for the engine.
//!
//! Every fallible operation in the crate returns [`Result`]. Storage errors are
//! wrapped transparently; domain failures carry enough context to be rendered
//! by whatever surface sits on top of the library.

use thiserror::Error;

/// Errors produced by the analytics and gamification engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced owner, category, goal, rule or transaction does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// The referenced record belongs to a different user.
    #[error("not authorized to use {entity} {id}")]
    Unauthorized {
        /// Kind of record that was referenced
        entity: &'static str,
        /// Identifier of the record
        id: i64,
    },

    /// A record or request is internally inconsistent (e.g. a malformed recurrence rule).
    #[error("invalid state: {message}")]
    InvalidState {
        /// Human-readable description of the inconsistency
        message: String,
    },

    /// Amount is zero, negative, or not a finite number.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Optimistic concurrency retries were exhausted.
    #[error("concurrent update conflict: {message}")]
    Conflict {
        /// Description of the contended record
        message: String,
    },

    /// Error reported by the database layer.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Integer conversion overflow.
    #[error("integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
