//! Low remaining budget warning.

use crate::format::format_currency;

/// Remaining budget at or below which (but above zero) the user is warned.
pub const BUDGET_ALERT_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetAlert {
    pub remaining: f64,
}

impl BudgetAlert {
    pub fn title(&self) -> &'static str {
        "Budget Alert"
    }

    pub fn message(&self) -> String {
        format!(
            "Your remaining budget is ${}. Consider reducing your expenses.",
            format_currency(self.remaining)
        )
    }
}

/// Alert when `remaining` lies in `(0, BUDGET_ALERT_THRESHOLD]`.
///
/// Called on every recompute; repeated calls in range alert again.
pub fn check_budget_alert(remaining: f64) -> Option<BudgetAlert> {
    if remaining > 0.0 && remaining <= BUDGET_ALERT_THRESHOLD {
        Some(BudgetAlert { remaining })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_range() {
        assert!(check_budget_alert(10.0).is_some());
        assert!(check_budget_alert(0.01).is_some());
        assert!(check_budget_alert(5.0).is_some());

        assert!(check_budget_alert(0.0).is_none());
        assert!(check_budget_alert(-3.0).is_none());
        assert!(check_budget_alert(10.01).is_none());
        assert!(check_budget_alert(f64::NAN).is_none());
    }

    #[test]
    fn test_alert_message() {
        let alert = check_budget_alert(7.5).unwrap();
        assert_eq!(alert.title(), "Budget Alert");
        assert_eq!(
            alert.message(),
            "Your remaining budget is $7.50. Consider reducing your expenses."
        );
    }
}
