//! Spending trends and ranked insights.
//!
//! The engine looks at a six-month window ending with the current (in-progress)
//! month. Expense spending is bucketed per month and per category, income per
//! month, and the buckets feed three insight generators:
//!
//! 1. overall spending change against the previous month,
//! 2. per-category changes against the previous month (top three),
//! 3. the savings trend, plus a comparison of this month with the average.
//!
//! Insights are finally ordered by priority, 1 being the most important. The
//! generation itself ([`analyze_trends`]) is pure; [`get_spending_trends`] only
//! fetches the window and hands it over.

use crate::{
    core::{
        aggregate::{CategoryTotal, accumulate, mean, percentage, rank_descending},
        ledger::{self, LedgerEntry, Scope},
        period::{DateRange, Month},
    },
    entities::TransactionKind,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// Number of months covered by the trends window, current month included.
pub const TREND_WINDOW_MONTHS: usize = 6;

const SPENDING_CHANGE_THRESHOLD: f64 = 5.0;
const CATEGORY_MIN_AMOUNT: f64 = 10.0;
const CATEGORY_CHANGE_THRESHOLD: f64 = 20.0;
const CATEGORY_LARGE_CHANGE: f64 = 50.0;
const CATEGORY_INSIGHT_LIMIT: usize = 3;
const SAVINGS_DEVIATION_THRESHOLD: f64 = 100.0;
const MOVER_LIMIT: usize = 5;
const TOP_CATEGORY_LIMIT: usize = 5;

/// What an insight talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightType {
    /// Overall spending went up
    SpendingIncrease,
    /// Overall spending went down
    SpendingDecrease,
    /// One category's spending went up
    CategoryIncrease,
    /// One category's spending went down
    CategoryDecrease,
    /// Average monthly savings
    SavingsTrend,
    /// This month's savings beat the average
    SavingsIncrease,
    /// This month's savings trail the average
    SavingsDecrease,
}

/// A human-readable statement derived from comparing periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingInsight {
    /// Text shown to the user
    pub message: String,
    /// Category the insight is about, if any
    pub category: Option<String>,
    /// Amount the insight refers to
    pub amount: f64,
    /// Signed percent change, if the insight is a comparison
    pub percentage_change: Option<f64>,
    /// What the current value was compared with
    pub comparison_period: Option<String>,
    /// Insight kind
    pub insight_type: InsightType,
    /// 1 is most important
    pub priority: u8,
}

/// One category's spending in one month of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAmount {
    /// Month label such as `Mar 2024`
    pub month: String,
    /// Amount spent in that month
    pub amount: f64,
}

/// Monthly spending series of a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMonthlySpending {
    /// Category display name
    pub category: String,
    /// Spending per month, oldest first
    pub months: Vec<MonthAmount>,
}

/// Everything the trends view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendsReport {
    /// Insights ordered by priority
    pub insights: Vec<SpendingInsight>,
    /// Income minus expenses this month
    pub current_month_savings: f64,
    /// Income minus expenses last month
    pub previous_month_savings: f64,
    /// Mean savings of the completed months in the window
    pub average_monthly_savings: f64,
    /// Share of this month's income saved, in percent
    pub savings_rate_current_month: f64,
    /// Mean savings rate over the whole window
    pub savings_rate_average: f64,
    /// Categories whose spending grew the most in absolute terms
    pub top_increasing_categories: Vec<CategoryTotal>,
    /// Categories whose spending shrank the most in absolute terms (amounts are positive)
    pub top_decreasing_categories: Vec<CategoryTotal>,
    /// Monthly series for the top spending categories of the window
    pub category_spending_by_month: Vec<CategoryMonthlySpending>,
    /// Expenses this month
    pub total_spending_current_month: f64,
    /// Expenses last month
    pub total_spending_previous_month: f64,
    /// Expenses two months ago
    pub total_spending_two_months_ago: f64,
    /// Percent change of expenses against last month, 0 when last month was empty
    pub percentage_change_in_spending: f64,
    /// Mean monthly expenses over the window
    pub average_monthly_spending: f64,
}

/// Spending and income of one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSnapshot {
    /// The month
    pub month: Month,
    /// Expense totals per category, in first-seen order
    pub spending_by_category: Vec<CategoryTotal>,
    /// Total expenses
    pub total_spending: f64,
    /// Total income
    pub total_income: f64,
}

impl MonthSnapshot {
    fn empty(month: Month) -> Self {
        Self {
            month,
            spending_by_category: Vec::new(),
            total_spending: 0.0,
            total_income: 0.0,
        }
    }

    /// Income minus expenses.
    #[must_use]
    pub fn savings(&self) -> f64 {
        self.total_income - self.total_spending
    }

    /// Savings as a percentage of income, 0 without income.
    #[must_use]
    pub fn savings_rate(&self) -> f64 {
        percentage(self.savings(), self.total_income)
    }

    /// Expenses in `category`, 0 if none.
    #[must_use]
    pub fn spent_on(&self, category: &str) -> f64 {
        self.spending_by_category
            .iter()
            .find(|total| total.category == category)
            .map_or(0.0, |total| total.amount)
    }
}

/// The six monthly snapshots of the window, oldest first, current month last.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    months: Vec<MonthSnapshot>,
}

impl TrendSeries {
    /// Buckets `entries` into the window ending with `current`.
    ///
    /// Entries outside the window and kinds other than income and expense are ignored.
    #[must_use]
    pub fn from_entries(entries: &[LedgerEntry], current: Month) -> Self {
        let months = current.trailing(TREND_WINDOW_MONTHS);
        let mut snapshots: Vec<MonthSnapshot> =
            months.iter().copied().map(MonthSnapshot::empty).collect();
        let mut category_items: Vec<Vec<(&str, f64)>> = vec![Vec::new(); months.len()];

        for entry in entries {
            let month = Month::of(&entry.transaction.occurred_at);
            let Some(index) = months.iter().position(|candidate| *candidate == month) else {
                continue;
            };
            let amount = entry.transaction.amount;
            match entry.transaction.kind {
                TransactionKind::Expense => {
                    snapshots[index].total_spending += amount;
                    category_items[index].push((entry.category_name(), amount));
                }
                TransactionKind::Income => snapshots[index].total_income += amount,
                _ => {}
            }
        }

        for (snapshot, items) in snapshots.iter_mut().zip(category_items) {
            snapshot.spending_by_category = accumulate(items);
        }

        Self { months: snapshots }
    }

    /// Snapshots, oldest first.
    #[must_use]
    pub fn months(&self) -> &[MonthSnapshot] {
        &self.months
    }

    fn back(&self, offset: usize) -> &MonthSnapshot {
        &self.months[self.months.len() - 1 - offset]
    }

    /// The in-progress month.
    #[must_use]
    pub fn current(&self) -> &MonthSnapshot {
        self.back(0)
    }

    /// The month before the current one.
    #[must_use]
    pub fn previous(&self) -> &MonthSnapshot {
        self.back(1)
    }

    /// Two months before the current one.
    #[must_use]
    pub fn two_months_ago(&self) -> &MonthSnapshot {
        self.back(2)
    }

    /// Categories seen in the current or previous month, current month's first.
    fn recent_categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for total in self
            .current()
            .spending_by_category
            .iter()
            .chain(&self.previous().spending_by_category)
        {
            if !names.contains(&total.category.as_str()) {
                names.push(&total.category);
            }
        }
        names
    }
}

/// Percent change from `previous` to `current`; new spending counts as +100%.
fn category_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        ((current - previous) / previous) * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

fn spending_change_insight(series: &TrendSeries) -> Option<SpendingInsight> {
    let current = series.current().total_spending;
    let previous = series.previous().total_spending;
    if previous <= 0.0 {
        return None;
    }

    let change = ((current - previous) / previous) * 100.0;
    if change.abs() < SPENDING_CHANGE_THRESHOLD {
        return None;
    }

    let (message, insight_type, priority) = if change > 0.0 {
        (
            format!("You spent {change:.1}% more overall this month compared to last month"),
            InsightType::SpendingIncrease,
            2,
        )
    } else {
        (
            format!(
                "You spent {:.1}% less overall this month compared to last month",
                change.abs()
            ),
            InsightType::SpendingDecrease,
            1,
        )
    };

    Some(SpendingInsight {
        message,
        category: None,
        amount: current,
        percentage_change: Some(change),
        comparison_period: Some("last month".to_string()),
        insight_type,
        priority,
    })
}

fn category_change_insights(series: &TrendSeries) -> Vec<SpendingInsight> {
    let current = series.current();
    let previous = series.previous();

    let mut changes: Vec<(&str, f64)> = series
        .recent_categories()
        .into_iter()
        .filter_map(|category| {
            let now = current.spent_on(category);
            let before = previous.spent_on(category);
            (now.max(before) >= CATEGORY_MIN_AMOUNT)
                .then(|| (category, category_change(now, before)))
        })
        .filter(|(_, change)| change.abs() >= CATEGORY_CHANGE_THRESHOLD)
        .collect();
    changes.sort_by(|a, b| b.1.total_cmp(&a.1));
    changes.truncate(CATEGORY_INSIGHT_LIMIT);

    changes
        .into_iter()
        .map(|(category, change)| {
            let (message, insight_type) = if change > 0.0 {
                (
                    format!("You spent {change:.1}% more on {category} this month"),
                    InsightType::CategoryIncrease,
                )
            } else {
                (
                    format!("You spent {:.1}% less on {category} this month", change.abs()),
                    InsightType::CategoryDecrease,
                )
            };
            SpendingInsight {
                message,
                category: Some(category.to_string()),
                amount: current.spent_on(category),
                percentage_change: Some(change),
                comparison_period: Some("last month".to_string()),
                insight_type,
                priority: if change.abs() > CATEGORY_LARGE_CHANGE { 1 } else { 2 },
            }
        })
        .collect()
}

/// Mean savings of every month in the window except the current one.
fn average_completed_savings(series: &TrendSeries) -> f64 {
    let completed = &series.months()[..series.months().len() - 1];
    let savings: Vec<f64> = completed.iter().map(MonthSnapshot::savings).collect();
    mean(&savings)
}

fn savings_insights(series: &TrendSeries, average: f64) -> Vec<SpendingInsight> {
    let mut insights = vec![SpendingInsight {
        message: format!("Your average monthly savings is ${average:.2}"),
        category: None,
        amount: average,
        percentage_change: None,
        comparison_period: None,
        insight_type: InsightType::SavingsTrend,
        priority: 1,
    }];

    let current = series.current().savings();
    let difference = current - average;
    if difference.abs() > SAVINGS_DEVIATION_THRESHOLD {
        let change = if average == 0.0 {
            0.0
        } else {
            (difference / average.abs()) * 100.0
        };
        let increased = difference > 0.0;
        let direction = if increased { "more" } else { "less" };
        let message = if average == 0.0 {
            format!(
                "You're saving ${:.2} {direction} than your average this month",
                difference.abs()
            )
        } else {
            format!(
                "You're saving {:.1}% {direction} than your average this month",
                change.abs()
            )
        };

        insights.push(SpendingInsight {
            message,
            category: None,
            amount: current,
            percentage_change: Some(change),
            comparison_period: Some("monthly average".to_string()),
            insight_type: if increased {
                InsightType::SavingsIncrease
            } else {
                InsightType::SavingsDecrease
            },
            priority: if increased { 1 } else { 2 },
        });
    }

    insights
}

/// Increasing and decreasing categories by absolute change, among categories
/// with spending in both the current and the previous month.
fn category_movers(series: &TrendSeries) -> (Vec<CategoryTotal>, Vec<CategoryTotal>) {
    let current = series.current();
    let previous = series.previous();

    let deltas: Vec<CategoryTotal> = series
        .recent_categories()
        .into_iter()
        .filter_map(|category| {
            let now = current.spent_on(category);
            let before = previous.spent_on(category);
            (now > 0.0 && before > 0.0).then(|| CategoryTotal::new(category, now - before))
        })
        .collect();

    let increasing = rank_descending(
        deltas.iter().filter(|d| d.amount > 0.0).cloned().collect(),
        MOVER_LIMIT,
    );

    let mut decreasing: Vec<CategoryTotal> =
        deltas.into_iter().filter(|d| d.amount < 0.0).collect();
    decreasing.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    decreasing.truncate(MOVER_LIMIT);
    for total in &mut decreasing {
        total.amount = total.amount.abs();
    }

    (increasing, decreasing)
}

/// Monthly series for the categories with the highest spending over the window.
fn top_category_series(series: &TrendSeries) -> Vec<CategoryMonthlySpending> {
    let window_totals = accumulate(series.months().iter().flat_map(|snapshot| {
        snapshot
            .spending_by_category
            .iter()
            .map(|total| (total.category.as_str(), total.amount))
    }));

    rank_descending(window_totals, TOP_CATEGORY_LIMIT)
        .into_iter()
        .map(|top| CategoryMonthlySpending {
            months: series
                .months()
                .iter()
                .map(|snapshot| MonthAmount {
                    month: snapshot.month.label(),
                    amount: snapshot.spent_on(&top.category),
                })
                .collect(),
            category: top.category,
        })
        .collect()
}

/// Builds the trends report for a prepared series.
#[must_use]
pub fn analyze_trends(series: &TrendSeries) -> TrendsReport {
    let current = series.current();
    let previous = series.previous();
    let average_monthly_savings = average_completed_savings(series);

    let mut insights = Vec::new();
    insights.extend(spending_change_insight(series));
    insights.extend(category_change_insights(series));
    insights.extend(savings_insights(series, average_monthly_savings));
    // Stable: equal priorities keep generation order.
    insights.sort_by_key(|insight| insight.priority);

    let (top_increasing_categories, top_decreasing_categories) = category_movers(series);

    let percentage_change_in_spending = if previous.total_spending > 0.0 {
        ((current.total_spending - previous.total_spending) / previous.total_spending) * 100.0
    } else {
        0.0
    };
    let savings_rates: Vec<f64> = series
        .months()
        .iter()
        .map(MonthSnapshot::savings_rate)
        .collect();
    let spending: Vec<f64> = series
        .months()
        .iter()
        .map(|snapshot| snapshot.total_spending)
        .collect();

    TrendsReport {
        insights,
        current_month_savings: current.savings(),
        previous_month_savings: previous.savings(),
        average_monthly_savings,
        savings_rate_current_month: current.savings_rate(),
        savings_rate_average: mean(&savings_rates),
        top_increasing_categories,
        top_decreasing_categories,
        category_spending_by_month: top_category_series(series),
        total_spending_current_month: current.total_spending,
        total_spending_previous_month: previous.total_spending,
        total_spending_two_months_ago: series.two_months_ago().total_spending,
        percentage_change_in_spending,
        average_monthly_spending: mean(&spending),
    }
}

/// Spending trends of `user_id` for the six months ending with the month of `now`.
pub async fn get_spending_trends(
    db: &DatabaseConnection,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<TrendsReport> {
    ledger::find_user(db, user_id).await?;

    let current = Month::of(&now);
    let window_start = current.trailing(TREND_WINDOW_MONTHS)[0].start();
    let window = DateRange::new(window_start, current.next().start());
    let entries = ledger::find_transactions(db, Scope::User(user_id), window).await?;

    tracing::debug!(
        user_id,
        entries = entries.len(),
        "Computing spending trends for {}",
        current.key()
    );
    Ok(analyze_trends(&TrendSeries::from_entries(&entries, current)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn march_2024() -> Month {
        Month::new(2024, 3).unwrap()
    }

    fn expense(amount: f64, category: &str, month: u32) -> LedgerEntry {
        test_entry(
            TransactionKind::Expense,
            amount,
            Some(category),
            utc(2024, month, 10),
        )
    }

    fn income(amount: f64, month: u32) -> LedgerEntry {
        test_entry(
            TransactionKind::Income,
            amount,
            Some("Salary"),
            utc(2024, month, 1),
        )
    }

    fn of_type(report: &TrendsReport, insight_type: InsightType) -> Vec<&SpendingInsight> {
        report
            .insights
            .iter()
            .filter(|insight| insight.insight_type == insight_type)
            .collect()
    }

    #[test]
    fn test_series_buckets_window() {
        let entries = vec![
            expense(100.0, "Food", 3),
            expense(50.0, "Food", 3),
            expense(70.0, "Fuel", 2),
            income(1000.0, 1),
            // Outside the window
            test_entry(TransactionKind::Expense, 999.0, Some("Food"), utc(2023, 9, 1)),
            // Neither income nor expense
            test_entry(TransactionKind::Savings, 10.0, Some("Pot"), utc(2024, 3, 2)),
        ];
        let series = TrendSeries::from_entries(&entries, march_2024());

        assert_eq!(series.months().len(), TREND_WINDOW_MONTHS);
        assert_eq!(series.months()[0].month, Month::new(2023, 10).unwrap());
        assert_eq!(series.current().total_spending, 150.0);
        assert_eq!(series.current().spent_on("Food"), 150.0);
        assert_eq!(series.previous().spent_on("Fuel"), 70.0);
        assert_eq!(series.two_months_ago().total_income, 1000.0);
        assert_eq!(series.months()[0].total_spending, 0.0);
    }

    #[test]
    fn test_spending_increase_of_twenty_percent() {
        let entries = vec![expense(1000.0, "Rent", 2), expense(1200.0, "Rent", 3)];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        let increases = of_type(&report, InsightType::SpendingIncrease);
        assert_eq!(increases.len(), 1);
        let change = increases[0].percentage_change.unwrap();
        assert!((change - 20.0).abs() < 1e-9);
        assert_eq!(increases[0].priority, 2);
        assert_eq!(increases[0].amount, 1200.0);
        assert_eq!(
            increases[0].message,
            "You spent 20.0% more overall this month compared to last month"
        );
        assert!((report.percentage_change_in_spending - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_spending_insight_without_previous_spend() {
        let entries = vec![expense(5000.0, "Rent", 3)];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        assert!(of_type(&report, InsightType::SpendingIncrease).is_empty());
        assert!(of_type(&report, InsightType::SpendingDecrease).is_empty());
        assert_eq!(report.percentage_change_in_spending, 0.0);
    }

    #[test]
    fn test_small_spending_change_is_ignored() {
        let entries = vec![expense(1000.0, "Rent", 2), expense(1040.0, "Rent", 3)];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));
        assert!(of_type(&report, InsightType::SpendingIncrease).is_empty());
    }

    #[test]
    fn test_spending_decrease_has_top_priority() {
        let entries = vec![expense(1000.0, "Rent", 2), expense(800.0, "Rent", 3)];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        let decreases = of_type(&report, InsightType::SpendingDecrease);
        assert_eq!(decreases.len(), 1);
        assert_eq!(decreases[0].priority, 1);
        assert_eq!(
            decreases[0].message,
            "You spent 20.0% less overall this month compared to last month"
        );
    }

    #[test]
    fn test_category_changes_filtered_sorted_and_limited() {
        let entries = vec![
            // +100% (new category)
            expense(40.0, "Games", 3),
            // +60%
            expense(100.0, "Food", 2),
            expense(160.0, "Food", 3),
            // +25%
            expense(100.0, "Fuel", 2),
            expense(125.0, "Fuel", 3),
            // -50%
            expense(200.0, "Clothes", 2),
            expense(100.0, "Clothes", 3),
            // +10%: below the change threshold
            expense(100.0, "Rent", 2),
            expense(110.0, "Rent", 3),
            // Below the minimum amount in both months
            expense(2.0, "Gum", 2),
            expense(8.0, "Gum", 3),
        ];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        let categories: Vec<&SpendingInsight> = report
            .insights
            .iter()
            .filter(|insight| insight.category.is_some())
            .collect();
        let names: Vec<&str> = categories
            .iter()
            .map(|insight| insight.category.as_deref().unwrap())
            .collect();
        // Top three by signed change are Games (+100), Food (+60), Fuel (+25);
        // the priority sort then moves the large changes first.
        assert_eq!(names, vec!["Games", "Food", "Fuel"]);
        assert_eq!(categories[0].priority, 1);
        assert_eq!(categories[0].percentage_change, Some(100.0));
        assert_eq!(categories[2].priority, 2);
        assert_eq!(categories[2].insight_type, InsightType::CategoryIncrease);
        assert_eq!(categories[2].message, "You spent 25.0% more on Fuel this month");
    }

    #[test]
    fn test_category_decrease_insight() {
        let entries = vec![expense(200.0, "Clothes", 2), expense(100.0, "Clothes", 3)];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        let decreases = of_type(&report, InsightType::CategoryDecrease);
        assert_eq!(decreases.len(), 1);
        assert_eq!(decreases[0].percentage_change, Some(-50.0));
        // Exactly 50% is not a "large" change.
        assert_eq!(decreases[0].priority, 2);
        assert_eq!(decreases[0].message, "You spent 50.0% less on Clothes this month");
    }

    #[test]
    fn test_savings_trend_always_present() {
        let report = analyze_trends(&TrendSeries::from_entries(&[], march_2024()));

        let trend = of_type(&report, InsightType::SavingsTrend);
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].amount, 0.0);
        assert_eq!(trend[0].message, "Your average monthly savings is $0.00");
        assert_eq!(report.insights.len(), 1);
    }

    #[test]
    fn test_savings_comparison_against_average() {
        let mut entries = Vec::new();
        // Five completed months saving 500 each
        for month in [1, 2] {
            entries.push(income(1000.0, month));
            entries.push(expense(500.0, "Rent", month));
        }
        entries.push(test_entry(
            TransactionKind::Income,
            1000.0,
            Some("Salary"),
            utc(2023, 10, 1),
        ));
        entries.push(test_entry(
            TransactionKind::Expense,
            500.0,
            Some("Rent"),
            utc(2023, 10, 5),
        ));
        for month in [11, 12] {
            entries.push(test_entry(
                TransactionKind::Income,
                1000.0,
                Some("Salary"),
                utc(2023, month, 1),
            ));
            entries.push(test_entry(
                TransactionKind::Expense,
                500.0,
                Some("Rent"),
                utc(2023, month, 5),
            ));
        }
        // Current month saves 800
        entries.push(income(1300.0, 3));
        entries.push(expense(500.0, "Rent", 3));

        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        assert_eq!(report.average_monthly_savings, 500.0);
        assert_eq!(report.current_month_savings, 800.0);
        let increase = of_type(&report, InsightType::SavingsIncrease);
        assert_eq!(increase.len(), 1);
        assert_eq!(increase[0].percentage_change, Some(60.0));
        assert_eq!(increase[0].priority, 1);
        assert!(of_type(&report, InsightType::SavingsDecrease).is_empty());
    }

    #[test]
    fn test_savings_decrease_with_zero_average() {
        let entries = vec![expense(300.0, "Rent", 3)];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        let decrease = of_type(&report, InsightType::SavingsDecrease);
        assert_eq!(decrease.len(), 1);
        assert_eq!(decrease[0].percentage_change, Some(0.0));
        assert_eq!(decrease[0].priority, 2);
        assert_eq!(
            decrease[0].message,
            "You're saving $300.00 less than your average this month"
        );
    }

    #[test]
    fn test_insights_sorted_by_priority() {
        let entries = vec![
            expense(1000.0, "Rent", 2),
            expense(1200.0, "Rent", 3),
            expense(100.0, "Food", 2),
            expense(20.0, "Food", 3),
        ];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        assert!(
            report
                .insights
                .windows(2)
                .all(|pair| pair[0].priority <= pair[1].priority)
        );
        assert_eq!(report.insights[0].priority, 1);
    }

    #[test]
    fn test_category_movers_use_absolute_change() {
        let entries = vec![
            expense(100.0, "Food", 2),
            expense(300.0, "Food", 3),
            expense(1000.0, "Rent", 2),
            expense(1100.0, "Rent", 3),
            expense(500.0, "Travel", 2),
            expense(50.0, "Travel", 3),
            expense(80.0, "Fuel", 2),
            expense(60.0, "Fuel", 3),
            // Only in the current month: excluded from movers
            expense(400.0, "Games", 3),
        ];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        assert_eq!(
            report.top_increasing_categories,
            vec![
                CategoryTotal::new("Food", 200.0),
                CategoryTotal::new("Rent", 100.0)
            ]
        );
        assert_eq!(
            report.top_decreasing_categories,
            vec![
                CategoryTotal::new("Travel", 450.0),
                CategoryTotal::new("Fuel", 20.0)
            ]
        );
    }

    #[test]
    fn test_category_spending_table_top_five_oldest_first() {
        let mut entries = Vec::new();
        for (index, name) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let amount = 100.0 * (index as f64 + 1.0);
            entries.push(expense(amount, name, 2));
        }
        entries.push(expense(5.0, "A", 1));

        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));
        let table = &report.category_spending_by_month;

        let names: Vec<&str> = table.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(names, vec!["F", "E", "D", "C", "B"]);

        let months: Vec<&str> = table[0].months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(
            months,
            vec!["Oct 2023", "Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]
        );
        assert_eq!(table[0].months[4].amount, 600.0);
        assert_eq!(table[0].months[5].amount, 0.0);
    }

    #[test]
    fn test_report_totals() {
        let entries = vec![
            expense(300.0, "Rent", 1),
            expense(200.0, "Rent", 2),
            expense(100.0, "Rent", 3),
            income(600.0, 3),
        ];
        let report = analyze_trends(&TrendSeries::from_entries(&entries, march_2024()));

        assert_eq!(report.total_spending_current_month, 100.0);
        assert_eq!(report.total_spending_previous_month, 200.0);
        assert_eq!(report.total_spending_two_months_ago, 300.0);
        assert_eq!(report.average_monthly_spending, 100.0);
        assert!((report.savings_rate_current_month - 500.0 / 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_get_spending_trends_reads_user_window() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "trends@example.com").await?;
        let other = create_test_user(&db, "other@example.com").await?;
        let rent = create_test_category(&db, "Rent", TransactionKind::Expense, None).await?;

        insert_test_transaction(&db, user.id, &rent, 1000.0, utc(2024, 2, 3)).await?;
        insert_test_transaction(&db, user.id, &rent, 1200.0, utc(2024, 3, 3)).await?;
        insert_test_transaction(&db, other.id, &rent, 9999.0, utc(2024, 3, 4)).await?;

        let report = get_spending_trends(&db, user.id, utc(2024, 3, 15)).await?;
        assert_eq!(report.total_spending_current_month, 1200.0);
        assert_eq!(report.total_spending_previous_month, 1000.0);
        assert!(
            report
                .insights
                .iter()
                .any(|insight| insight.insight_type == InsightType::SpendingIncrease)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_get_spending_trends_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_spending_trends(&db, 77, utc(2024, 3, 15)).await;
        assert!(matches!(
            result,
            Err(crate::errors::Error::NotFound { entity: "user", .. })
        ));
        Ok(())
    }
}
