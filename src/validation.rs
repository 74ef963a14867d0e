//! Client-side input validation. Failures never reach the API.

use thiserror::Error;

use crate::api::{ExpenseUpdate, NewExpense};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingName,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Description is required")]
    MissingDescription,

    #[error("User ID is required")]
    MissingUserId,

    #[error("Please enter a valid budget amount")]
    InvalidBudget,

    #[error("Please fill in all fields")]
    MissingFields,
}

/// Parse `raw` as a strictly positive, finite number.
pub fn positive_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Check a new expense. The first failing field wins, in form order.
pub fn validate_expense(expense: &NewExpense) -> Result<(), ValidationError> {
    if expense.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if positive_amount(&expense.amount).is_none() {
        return Err(ValidationError::InvalidAmount);
    }
    if expense.description.is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    if expense.user_id.is_empty() {
        return Err(ValidationError::MissingUserId);
    }
    Ok(())
}

/// Check the fields present in an edit with the same rules as a new expense.
pub fn validate_update(update: &ExpenseUpdate) -> Result<(), ValidationError> {
    if update.name.as_deref().is_some_and(str::is_empty) {
        return Err(ValidationError::MissingName);
    }
    if let Some(amount) = &update.amount {
        if positive_amount(amount).is_none() {
            return Err(ValidationError::InvalidAmount);
        }
    }
    if update.description.as_deref().is_some_and(str::is_empty) {
        return Err(ValidationError::MissingDescription);
    }
    Ok(())
}

/// Check a monthly budget entry and return its value.
pub fn validate_budget(raw: &str) -> Result<f64, ValidationError> {
    positive_amount(raw).ok_or(ValidationError::InvalidBudget)
}
