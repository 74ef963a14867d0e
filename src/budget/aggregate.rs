//! Spend aggregation over a user's expenses.

use std::collections::HashMap;

use crate::api::Expense;

/// Bucket for expenses whose name has no leading word.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Parse a string-encoded amount. Anything that is not a finite number is zero.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Category of an expense: the first whitespace-delimited word of its name.
pub fn category_key(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(UNCATEGORIZED)
}

/// Total spend of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBucket {
    pub category: String,
    pub total: f64,
}

/// Everything the dashboard shows about spend against the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingSummary {
    pub monthly_budget: f64,
    pub total_spent: f64,
    /// `monthly_budget - total_spent`; negative when over budget.
    pub remaining: f64,
    /// Sorted by total, largest first.
    pub categories: Vec<CategoryBucket>,
}

impl SpendingSummary {
    /// Share of the budget already spent, in percent. Zero without a budget.
    pub fn percent_used(&self) -> f64 {
        if self.monthly_budget > 0.0 {
            self.total_spent / self.monthly_budget * 100.0
        } else {
            0.0
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.percent_used() > 100.0
    }
}

/// Expenses owned by `user_id`, in their original order.
///
/// An empty `user_id` owns nothing, so ownerless records never match.
pub fn expenses_for_user<'a>(expenses: &'a [Expense], user_id: &str) -> Vec<&'a Expense> {
    if user_id.is_empty() {
        return Vec::new();
    }
    expenses.iter().filter(|e| e.user_id == user_id).collect()
}

pub fn total_spent(expenses: &[&Expense]) -> f64 {
    expenses.iter().map(|e| e.amount_value()).sum()
}

/// Group spend by category.
///
/// # Postconditions
/// - Sorted by total descending
/// - Equal totals keep the order in which their category first appeared
pub fn spending_by_category(expenses: &[&Expense]) -> Vec<CategoryBucket> {
    let mut buckets: Vec<CategoryBucket> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for expense in expenses {
        let key = category_key(&expense.name);
        let amount = expense.amount_value();
        match index.get(key) {
            Some(&i) => buckets[i].total += amount,
            None => {
                index.insert(key, buckets.len());
                buckets.push(CategoryBucket {
                    category: key.to_string(),
                    total: amount,
                });
            }
        }
    }

    // sort_by is stable, which gives the first-seen tie order.
    buckets.sort_by(|a, b| b.total.total_cmp(&a.total));
    buckets
}

/// Run the whole pipeline for one user.
pub fn summarize(expenses: &[Expense], user_id: &str, monthly_budget: f64) -> SpendingSummary {
    let owned = expenses_for_user(expenses, user_id);
    let total = total_spent(&owned);
    SpendingSummary {
        monthly_budget,
        total_spent: total,
        remaining: monthly_budget - total,
        categories: spending_by_category(&owned),
    }
}
