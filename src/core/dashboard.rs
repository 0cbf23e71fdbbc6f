//! Dashboard composition - single-user and system-wide summaries.
//!
//! Both views share one pipeline: fetch the ledger for the requested range, let
//! the aggregator reduce it, then fold in budgets, goals, recurring rules and
//! recent activity. The only differences are the query scope and the length of
//! the ranked lists.

use crate::{
    config::settings::DashboardConfig,
    core::{
        aggregate::{
            CategoryTotal, category_breakdown, expenses_by_category_id, mean, monthly_breakdown,
            percentage, total_by_kind,
        },
        ledger::{self, LedgerEntry, Scope},
        period::DateRange,
    },
    entities::{GoalStatus, TransactionKind, budget, category, goal, recurring_transaction},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A recent transaction as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction id
    pub id: i64,
    /// Free-text description
    pub description: String,
    /// Amount
    pub amount: f64,
    /// Transaction kind
    pub kind: TransactionKind,
    /// Category display name
    pub category_name: String,
    /// When the transaction happened
    pub occurred_at: DateTime<Utc>,
    /// Owner id
    pub user_id: i64,
    /// Owner display name, if the owner still exists
    pub user_name: Option<String>,
}

/// A recent goal as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSummary {
    /// Goal id
    pub id: i64,
    /// Goal name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Amount to reach
    pub target_amount: f64,
    /// Amount saved so far
    pub current_amount: f64,
    /// `current / target * 100`, 0 for a non-positive target
    pub progress_percentage: f64,
    /// Completion state
    pub status: GoalStatus,
    /// Optional deadline
    pub target_date: Option<DateTime<Utc>>,
    /// Linked category name, if any
    pub category_name: Option<String>,
    /// Owner id
    pub user_id: i64,
    /// Owner display name, if the owner still exists
    pub user_name: Option<String>,
}

/// Financial overview for one user or for the whole system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Income in range
    pub total_income: f64,
    /// Expenses in range
    pub total_expenses: f64,
    /// Income minus expenses
    pub net_balance: f64,
    /// Share of income not spent, in percent
    pub savings_rate: f64,

    /// Number of budgets
    pub total_budgets: usize,
    /// Budgets whose category spend stays within the amount
    pub budgets_on_track: usize,
    /// Budgets whose category spend exceeds the amount
    pub budgets_over_budget: usize,
    /// Spend across budgeted categories over total budgeted amount, in percent
    pub budget_utilization_percentage: f64,

    /// Number of goals
    pub total_goals: usize,
    /// Goals with status COMPLETED
    pub completed_goals: usize,
    /// Goals with status `IN_PROGRESS`
    pub in_progress_goals: usize,
    /// Mean progress percentage over all goals
    pub average_goal_completion: f64,

    /// Number of recurrence rules, active or not
    pub total_recurring_transactions: usize,
    /// Sum of active income rules
    pub monthly_recurring_income: f64,
    /// Sum of active expense rules
    pub monthly_recurring_expenses: f64,

    /// Largest expense categories, descending
    pub top_expense_categories: Vec<CategoryTotal>,
    /// Largest income categories, descending
    pub top_income_categories: Vec<CategoryTotal>,

    /// Expenses per `YYYY-MM`
    pub expenses_by_month: BTreeMap<String, f64>,
    /// Income per `YYYY-MM`
    pub income_by_month: BTreeMap<String, f64>,

    /// Most recently created transactions, newest first
    pub recent_transactions: Vec<TransactionSummary>,
    /// Most recently created goals, newest first
    pub recent_goals: Vec<GoalSummary>,
}

/// Budget counters derived from range spend.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BudgetOverview {
    /// Number of budgets
    pub total: usize,
    /// Budgets over their amount
    pub over_budget: usize,
    /// Utilization in percent
    pub utilization_percentage: f64,
}

/// Goal counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GoalOverview {
    /// Number of goals
    pub total: usize,
    /// Completed goals
    pub completed: usize,
    /// Goals in progress
    pub in_progress: usize,
    /// Mean progress percentage
    pub average_completion: f64,
}

/// Per-user activity statistics for administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// User id
    pub user_id: i64,
    /// Email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Transactions in range
    pub transaction_count: usize,
    /// Goals owned (all time)
    pub goal_count: usize,
    /// Budgets owned (all time)
    pub budget_count: usize,
    /// Expenses in range
    pub total_spent: f64,
    /// Income in range
    pub total_income: f64,
    /// Savings rate in range, in percent
    pub savings_rate: f64,
    /// Latest transaction creation in range, or account creation
    pub last_active: DateTime<Utc>,
}

/// Per-category usage statistics for administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Category id
    pub category_id: i64,
    /// Category name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Category kind
    pub kind: TransactionKind,
    /// Transactions in range
    pub transaction_count: usize,
    /// Summed amount in range
    pub total_amount: f64,
    /// Share of the range total of the category's kind (income or expense), in percent
    pub percentage_of_total: f64,
    /// Distinct users with transactions in this category
    pub user_count: usize,
}

/// Progress of a goal in percent, 0 for a non-positive target.
#[must_use]
pub fn goal_progress_percentage(goal: &goal::Model) -> f64 {
    percentage(goal.current_amount, goal.target_amount)
}

/// Compares budgets with the expense spend of the given entries.
///
/// A budget without a category contributes its amount but never any spend.
#[must_use]
pub fn summarize_budgets(budgets: &[budget::Model], entries: &[LedgerEntry]) -> BudgetOverview {
    let spending = expenses_by_category_id(entries);
    let mut budgeted = 0.0;
    let mut spent = 0.0;
    let mut over_budget = 0;

    for budget in budgets {
        let category_spend = budget
            .category_id
            .and_then(|id| spending.get(&id).copied())
            .unwrap_or(0.0);
        budgeted += budget.amount;
        spent += category_spend;
        if category_spend > budget.amount {
            over_budget += 1;
        }
    }

    BudgetOverview {
        total: budgets.len(),
        over_budget,
        utilization_percentage: percentage(spent, budgeted),
    }
}

/// Counts goals by status and averages their progress.
#[must_use]
pub fn summarize_goals(goals: &[goal::Model]) -> GoalOverview {
    let progress: Vec<f64> = goals.iter().map(goal_progress_percentage).collect();
    GoalOverview {
        total: goals.len(),
        completed: goals
            .iter()
            .filter(|goal| goal.status == GoalStatus::Completed)
            .count(),
        in_progress: goals
            .iter()
            .filter(|goal| goal.status == GoalStatus::InProgress)
            .count(),
        average_completion: mean(&progress),
    }
}

/// Flat `(income, expenses)` sums over the active rules.
#[must_use]
pub fn recurring_totals(rules: &[recurring_transaction::Model]) -> (f64, f64) {
    let sum = |kind: TransactionKind| -> f64 {
        rules
            .iter()
            .filter(|rule| rule.active && rule.kind == kind)
            .map(|rule| rule.amount)
            .sum()
    };
    (sum(TransactionKind::Income), sum(TransactionKind::Expense))
}

async fn user_names(db: &DatabaseConnection) -> Result<HashMap<i64, String>> {
    Ok(ledger::find_users(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user.full_name))
        .collect())
}

async fn category_names(db: &DatabaseConnection) -> Result<HashMap<i64, String>> {
    Ok(ledger::find_categories(db)
        .await?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect())
}

async fn recent_activity(
    db: &DatabaseConnection,
    scope: Scope,
    limit: usize,
) -> Result<(Vec<TransactionSummary>, Vec<GoalSummary>)> {
    let limit = u64::try_from(limit)?;
    let users = user_names(db).await?;
    let categories = category_names(db).await?;

    let transactions = ledger::find_recent_transactions(db, scope, limit)
        .await?
        .into_iter()
        .map(|entry| TransactionSummary {
            category_name: entry.category_name().to_string(),
            user_name: users.get(&entry.transaction.user_id).cloned(),
            id: entry.transaction.id,
            description: entry.transaction.description,
            amount: entry.transaction.amount,
            kind: entry.transaction.kind,
            occurred_at: entry.transaction.occurred_at,
            user_id: entry.transaction.user_id,
        })
        .collect();

    let goals = ledger::find_recent_goals(db, scope, limit)
        .await?
        .into_iter()
        .map(|goal| GoalSummary {
            progress_percentage: goal_progress_percentage(&goal),
            category_name: goal.category_id.and_then(|id| categories.get(&id).cloned()),
            user_name: users.get(&goal.user_id).cloned(),
            id: goal.id,
            name: goal.name,
            description: goal.description,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            status: goal.status,
            target_date: goal.target_date,
            user_id: goal.user_id,
        })
        .collect();

    Ok((transactions, goals))
}

async fn compose_summary(
    db: &DatabaseConnection,
    scope: Scope,
    range: DateRange,
    limit: usize,
) -> Result<DashboardSummary> {
    // Every read completes before any aggregation starts.
    let entries = ledger::find_transactions(db, scope, range).await?;
    let budgets = ledger::find_budgets(db, scope).await?;
    let goals = ledger::find_goals(db, scope).await?;
    let rules = ledger::find_recurring_rules(db, scope).await?;
    let (recent_transactions, recent_goals) = recent_activity(db, scope, limit).await?;

    let total_income = total_by_kind(&entries, TransactionKind::Income);
    let total_expenses = total_by_kind(&entries, TransactionKind::Expense);
    let budget_overview = summarize_budgets(&budgets, &entries);
    let goal_overview = summarize_goals(&goals);
    let (monthly_recurring_income, monthly_recurring_expenses) = recurring_totals(&rules);

    Ok(DashboardSummary {
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        savings_rate: percentage(total_income - total_expenses, total_income),
        total_budgets: budget_overview.total,
        budgets_on_track: budget_overview.total - budget_overview.over_budget,
        budgets_over_budget: budget_overview.over_budget,
        budget_utilization_percentage: budget_overview.utilization_percentage,
        total_goals: goal_overview.total,
        completed_goals: goal_overview.completed,
        in_progress_goals: goal_overview.in_progress,
        average_goal_completion: goal_overview.average_completion,
        total_recurring_transactions: rules.len(),
        monthly_recurring_income,
        monthly_recurring_expenses,
        top_expense_categories: category_breakdown(&entries, TransactionKind::Expense, limit),
        top_income_categories: category_breakdown(&entries, TransactionKind::Income, limit),
        expenses_by_month: monthly_breakdown(&entries, TransactionKind::Expense),
        income_by_month: monthly_breakdown(&entries, TransactionKind::Income),
        recent_transactions,
        recent_goals,
    })
}

/// Builds the dashboard of one user.
///
/// Without an explicit `range` the last `default_range_months` months up to `now`
/// are summarized.
pub async fn get_user_summary(
    db: &DatabaseConnection,
    config: &DashboardConfig,
    user_id: i64,
    range: Option<DateRange>,
    now: DateTime<Utc>,
) -> Result<DashboardSummary> {
    ledger::find_user(db, user_id).await?;
    let range = DateRange::resolve(range, now, config.default_range_months);
    compose_summary(db, Scope::User(user_id), range, config.user_limit).await
}

/// Builds the system-wide dashboard.
pub async fn get_admin_summary(
    db: &DatabaseConnection,
    config: &DashboardConfig,
    range: Option<DateRange>,
    now: DateTime<Utc>,
) -> Result<DashboardSummary> {
    let range = DateRange::resolve(range, now, config.default_range_months);
    compose_summary(db, Scope::System, range, config.admin_limit).await
}

/// Per-user statistics for every user, ordered by user id.
pub async fn get_all_user_stats(
    db: &DatabaseConnection,
    config: &DashboardConfig,
    range: Option<DateRange>,
    now: DateTime<Utc>,
) -> Result<Vec<UserStats>> {
    let range = DateRange::resolve(range, now, config.default_range_months);
    let users = ledger::find_users(db).await?;
    let entries = ledger::find_transactions(db, Scope::System, range).await?;
    let goals = ledger::find_goals(db, Scope::System).await?;
    let budgets = ledger::find_budgets(db, Scope::System).await?;

    let mut by_user: HashMap<i64, Vec<LedgerEntry>> = HashMap::new();
    for entry in entries {
        by_user
            .entry(entry.transaction.user_id)
            .or_default()
            .push(entry);
    }

    Ok(users
        .into_iter()
        .map(|user| {
            let own = by_user.remove(&user.id).unwrap_or_default();
            let total_income = total_by_kind(&own, TransactionKind::Income);
            let total_spent = total_by_kind(&own, TransactionKind::Expense);
            let last_active = own
                .iter()
                .map(|entry| entry.transaction.created_at)
                .max()
                .unwrap_or(user.created_at);

            UserStats {
                transaction_count: own.len(),
                goal_count: goals.iter().filter(|g| g.user_id == user.id).count(),
                budget_count: budgets.iter().filter(|b| b.user_id == user.id).count(),
                total_spent,
                total_income,
                savings_rate: percentage(total_income - total_spent, total_income),
                last_active,
                user_id: user.id,
                email: user.email,
                full_name: user.full_name,
                created_at: user.created_at,
            }
        })
        .collect())
}

/// Usage statistics for every category, ordered by category id.
pub async fn get_category_stats(
    db: &DatabaseConnection,
    config: &DashboardConfig,
    range: Option<DateRange>,
    now: DateTime<Utc>,
) -> Result<Vec<CategoryStats>> {
    let range = DateRange::resolve(range, now, config.default_range_months);
    let categories = ledger::find_categories(db).await?;
    let entries = ledger::find_transactions(db, Scope::System, range).await?;
    Ok(category_statistics(&categories, &entries))
}

/// Computes [`CategoryStats`] for `categories` over `entries`.
#[must_use]
pub fn category_statistics(
    categories: &[category::Model],
    entries: &[LedgerEntry],
) -> Vec<CategoryStats> {
    let total_expenses = total_by_kind(entries, TransactionKind::Expense);
    let total_income = total_by_kind(entries, TransactionKind::Income);

    categories
        .iter()
        .map(|category| {
            let own: Vec<&LedgerEntry> = entries
                .iter()
                .filter(|entry| entry.transaction.category_id == category.id)
                .collect();
            let total_amount: f64 = own.iter().map(|entry| entry.transaction.amount).sum();
            let users: HashSet<i64> = own.iter().map(|entry| entry.transaction.user_id).collect();
            let percentage_of_total = match category.kind {
                TransactionKind::Expense => percentage(total_amount, total_expenses),
                TransactionKind::Income => percentage(total_amount, total_income),
                _ => 0.0,
            };

            CategoryStats {
                category_id: category.id,
                name: category.name.clone(),
                description: category.description.clone(),
                kind: category.kind,
                transaction_count: own.len(),
                total_amount,
                percentage_of_total,
                user_count: users.len(),
            }
        })
        .collect()
}
