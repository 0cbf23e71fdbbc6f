/// Achievement catalogue and idempotent awarding
pub mod achievement;
/// Pure sums, breakdowns and rankings over ledger entries
pub mod aggregate;
/// Single-user and system-wide dashboard summaries
pub mod dashboard;
/// Transaction events driving XP and saving streaks
pub mod gamification;
/// Savings goals and their derived status
pub mod goal;
/// Six-month spending trends and ranked insights
pub mod insights;
/// Read queries over the ledger tables
pub mod ledger;
/// Date ranges and calendar months
pub mod period;
/// XP, level and streak state with versioned persistence
pub mod progress;
/// Recurring transaction rules and the daily materializer
pub mod recurring;
/// Validated transaction creation
pub mod transaction;
