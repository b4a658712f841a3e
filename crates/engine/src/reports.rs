//! Read-only views computed from loaded expenses and balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AllocationPolicy, ExpenseRecord, Money};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total: Money,
    pub count: usize,
}

/// Total spent and number of expenses.
pub fn summarize(expenses: &[ExpenseRecord]) -> ExpenseSummary {
    ExpenseSummary {
        total: expenses.iter().map(|expense| expense.amount).sum(),
        count: expenses.len(),
    }
}

/// Total spent per category, for every category that appears in `expenses`.
pub fn spent_by_category(expenses: &[ExpenseRecord]) -> BTreeMap<String, Money> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals
            .entry(expense.category.clone())
            .or_insert(Money::ZERO) += expense.amount;
    }
    totals
}

/// One column per category holding its expense amounts in order, padded with
/// `None` so every column has the same length. Rows are returned row-major.
pub fn category_matrix(expenses: &[ExpenseRecord], categories: &[&str]) -> Vec<Vec<Option<Money>>> {
    let columns: Vec<Vec<Money>> = categories
        .iter()
        .map(|category| {
            expenses
                .iter()
                .filter(|expense| expense.category == *category)
                .map(|expense| expense.amount)
                .collect()
        })
        .collect();
    let height = columns.iter().map(Vec::len).max().unwrap_or(0);

    (0..height)
        .map(|row| {
            columns
                .iter()
                .map(|column| column.get(row).copied())
                .collect()
        })
        .collect()
}

/// A bucket as shown on a budget overview.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketStatus {
    pub category: String,
    pub balance: Money,
    pub cap: Option<Money>,
    /// `balance / cap` clamped to `0.0..=1.0`; `None` when uncapped.
    pub fill_ratio: Option<f64>,
}

/// Status of every policy category, in policy order. Missing balances count
/// as zero.
pub fn bucket_statuses(
    balances: &BTreeMap<String, Money>,
    policy: &AllocationPolicy,
) -> Vec<BucketStatus> {
    policy
        .categories()
        .into_iter()
        .map(|category| {
            let balance = balances.get(category).copied().unwrap_or_default();
            let cap = policy.cap(category);
            let fill_ratio = cap.map(|cap| {
                (balance.cents() as f64 / cap.cents() as f64).clamp(0.0, 1.0)
            });
            BucketStatus {
                category: category.to_string(),
                balance,
                cap,
                fill_ratio,
            }
        })
        .collect()
}
