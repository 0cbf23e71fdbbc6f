//! Aggregation over a set of ledger entries.
//!
//! Every function here is pure: the caller fetches the entries for the period it
//! cares about and the aggregator only sums, groups and ranks them. An empty input
//! yields zero totals and empty collections.

use crate::{core::ledger::LedgerEntry, core::period::Month, entities::TransactionKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An amount attributed to a named category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category display name
    pub category: String,
    /// Summed amount
    pub amount: f64,
}

impl CategoryTotal {
    /// Creates a total for `category`.
    #[must_use]
    pub fn new(category: impl Into<String>, amount: f64) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
#[must_use]
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole) * 100.0
    } else {
        0.0
    }
}

/// Arithmetic mean, 0 for an empty input.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    // Cast safety: a handful of months or goals, far below f64 precision limits.
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    values.iter().sum::<f64>() / count
}

/// Sum of amounts of the entries of `kind`.
#[must_use]
pub fn total_by_kind(entries: &[LedgerEntry], kind: TransactionKind) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.transaction.kind == kind)
        .map(|entry| entry.transaction.amount)
        .sum()
}

/// Sums amounts per name, keeping names in first-seen order.
pub fn accumulate<'a, I>(items: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for (name, amount) in items {
        if let Some(&position) = positions.get(name) {
            totals[position].amount += amount;
        } else {
            positions.insert(name, totals.len());
            totals.push(CategoryTotal::new(name, amount));
        }
    }

    totals
}

/// Sorts descending by amount and truncates to `limit`.
///
/// The sort is stable, so equal amounts keep their incoming order.
pub fn rank_descending(mut totals: Vec<CategoryTotal>, limit: usize) -> Vec<CategoryTotal> {
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals.truncate(limit);
    totals
}

/// Per-category sums of the entries of `kind`, largest first, at most `limit` entries.
#[must_use]
pub fn category_breakdown(
    entries: &[LedgerEntry],
    kind: TransactionKind,
    limit: usize,
) -> Vec<CategoryTotal> {
    let totals = accumulate(
        entries
            .iter()
            .filter(|entry| entry.transaction.kind == kind)
            .map(|entry| (entry.category_name(), entry.transaction.amount)),
    );
    rank_descending(totals, limit)
}

/// Per-month sums (`YYYY-MM` keys) of the entries of `kind`.
///
/// Only months with at least one matching entry appear.
#[must_use]
pub fn monthly_breakdown(entries: &[LedgerEntry], kind: TransactionKind) -> BTreeMap<String, f64> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for entry in entries.iter().filter(|entry| entry.transaction.kind == kind) {
        let key = Month::of(&entry.transaction.occurred_at).key();
        *months.entry(key).or_insert(0.0) += entry.transaction.amount;
    }
    months
}

/// Expense totals keyed by category id, used for budget comparison.
#[must_use]
pub fn expenses_by_category_id(entries: &[LedgerEntry]) -> HashMap<i64, f64> {
    let mut spending = HashMap::new();
    for entry in entries
        .iter()
        .filter(|entry| entry.transaction.kind == TransactionKind::Expense)
    {
        *spending.entry(entry.transaction.category_id).or_insert(0.0) += entry.transaction.amount;
    }
    spending
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn sample() -> Vec<LedgerEntry> {
        vec![
            test_entry(TransactionKind::Income, 3000.0, Some("Salary"), utc(2024, 1, 5)),
            test_entry(TransactionKind::Expense, 120.0, Some("Food"), utc(2024, 1, 6)),
            test_entry(TransactionKind::Expense, 900.0, Some("Rent"), utc(2024, 1, 7)),
            test_entry(TransactionKind::Expense, 80.0, Some("Food"), utc(2024, 2, 2)),
            test_entry(TransactionKind::Savings, 500.0, Some("Savings"), utc(2024, 2, 3)),
            test_entry(TransactionKind::Income, 250.0, Some("Freelance"), utc(2024, 2, 9)),
        ]
    }

    #[test]
    fn test_total_by_kind_matches_manual_sum() {
        let entries = sample();
        assert_eq!(total_by_kind(&entries, TransactionKind::Income), 3250.0);
        assert_eq!(total_by_kind(&entries, TransactionKind::Expense), 1100.0);
        assert_eq!(total_by_kind(&entries, TransactionKind::Debt), 0.0);
    }

    #[test]
    fn test_empty_input_yields_zeroes() {
        let entries: Vec<LedgerEntry> = Vec::new();
        assert_eq!(total_by_kind(&entries, TransactionKind::Income), 0.0);
        assert!(category_breakdown(&entries, TransactionKind::Expense, 5).is_empty());
        assert!(monthly_breakdown(&entries, TransactionKind::Expense).is_empty());
        assert!(expenses_by_category_id(&entries).is_empty());
    }

    #[test]
    fn test_category_breakdown_sorted_and_limited() {
        let entries = sample();
        let breakdown = category_breakdown(&entries, TransactionKind::Expense, 5);
        assert_eq!(
            breakdown,
            vec![CategoryTotal::new("Rent", 900.0), CategoryTotal::new("Food", 200.0)]
        );

        let limited = category_breakdown(&entries, TransactionKind::Expense, 1);
        assert_eq!(limited, vec![CategoryTotal::new("Rent", 900.0)]);

        assert!(
            breakdown
                .windows(2)
                .all(|pair| pair[0].amount >= pair[1].amount)
        );
    }

    #[test]
    fn test_category_breakdown_ties_keep_first_seen_order() {
        let entries = vec![
            test_entry(TransactionKind::Expense, 50.0, Some("Books"), utc(2024, 1, 1)),
            test_entry(TransactionKind::Expense, 50.0, Some("Games"), utc(2024, 1, 2)),
            test_entry(TransactionKind::Expense, 50.0, Some("Music"), utc(2024, 1, 3)),
        ];
        let names: Vec<String> = category_breakdown(&entries, TransactionKind::Expense, 2)
            .into_iter()
            .map(|total| total.category)
            .collect();
        assert_eq!(names, vec!["Books", "Games"]);
    }

    #[test]
    fn test_monthly_breakdown_only_months_with_data() {
        let entries = sample();
        let expenses = monthly_breakdown(&entries, TransactionKind::Expense);
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses["2024-01"], 1020.0);
        assert_eq!(expenses["2024-02"], 80.0);

        let savings = monthly_breakdown(&entries, TransactionKind::Savings);
        assert_eq!(savings.keys().collect::<Vec<_>>(), vec!["2024-02"]);
    }

    #[test]
    fn test_uncategorized_entries_are_grouped() {
        let entries = vec![
            test_entry(TransactionKind::Expense, 10.0, None, utc(2024, 1, 1)),
            test_entry(TransactionKind::Expense, 15.0, None, utc(2024, 1, 2)),
        ];
        let breakdown = category_breakdown(&entries, TransactionKind::Expense, 5);
        assert_eq!(breakdown, vec![CategoryTotal::new("Uncategorized", 25.0)]);
    }

    #[test]
    fn test_percentage_and_mean_guard_zero() {
        assert_eq!(percentage(50.0, 200.0), 25.0);
        assert_eq!(percentage(50.0, 0.0), 0.0);
        assert_eq!(percentage(50.0, -10.0), 0.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[10.0, 20.0]), 15.0);
    }
}
