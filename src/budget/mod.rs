//! Budget module - spend aggregation for the dashboard.
//!
//! # Key Concepts
//! - Summary: total spend and remaining budget for one user
//! - Categories: spend grouped by the first word of the expense name
//! - Pager: how many category rows are visible
//! - Alert: warning when the remaining budget gets close to zero

mod aggregate;
mod alert;
mod pagination;

pub use aggregate::{
    category_key, expenses_for_user, parse_amount, spending_by_category, summarize,
    total_spent, CategoryBucket, SpendingSummary, UNCATEGORIZED,
};
pub use alert::{check_budget_alert, BudgetAlert, BUDGET_ALERT_THRESHOLD};
pub use pagination::{CategoryPager, PAGE_SIZE};
