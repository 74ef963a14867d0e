//! Remote expense API.
//!
//! ## Endpoints
//!
//! - `GET /users?username={u}` - Look up users by username
//! - `GET /expenses` - List every expense (all users)
//! - `GET /expenses/{id}` - Fetch one expense
//! - `POST /expenses` - Create an expense
//! - `PUT /expenses/{id}` - Update an expense
//! - `DELETE /expenses/{id}` - Delete an expense

mod client;
mod error;
#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpClient;
pub use error::{classify_http_status, ApiError, ApiErrorKind};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// A user record as stored by the API.
///
/// The password is stored and compared in plaintext; see `Session::login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub created_at: String,
}

/// An expense record.
///
/// `amount` stays string-encoded as it travels on the wire. Use
/// [`Expense::amount_value`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: String,
    #[serde(default)]
    pub description: String,
    /// Empty for records without an owner; they match no user.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub created_at: String,
}

impl Expense {
    /// Numeric amount, zero when the stored text is absent or not a finite number.
    pub fn amount_value(&self) -> f64 {
        crate::budget::parse_amount(&self.amount)
    }
}

/// Body of `POST /expenses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub name: String,
    pub amount: String,
    pub description: String,
    pub user_id: String,
}

/// Body of `PUT /expenses/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.amount.is_none() && self.description.is_none()
    }

    /// Apply the present fields onto `expense`.
    pub fn apply_to(&self, expense: &mut Expense) {
        if let Some(name) = &self.name {
            expense.name = name.clone();
        }
        if let Some(amount) = &self.amount {
            expense.amount = amount.clone();
        }
        if let Some(description) = &self.description {
            expense.description = description.clone();
        }
    }
}

/// Accept the amount as a JSON string, number, or null.
fn lenient_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Operations the client needs from the remote API.
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    /// Users whose username matches exactly.
    async fn find_users(&self, username: &str) -> Result<Vec<User>, ApiError>;

    /// Every expense, unfiltered by user.
    async fn list_expenses(&self) -> Result<Vec<Expense>, ApiError>;

    async fn get_expense(&self, id: &str) -> Result<Expense, ApiError>;

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError>;

    async fn update_expense(&self, id: &str, update: &ExpenseUpdate) -> Result<Expense, ApiError>;

    async fn delete_expense(&self, id: &str) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_wire_format() {
        let json = r#"{
            "id": "7",
            "name": "Food Lunch",
            "amount": "12.50",
            "description": "noodles",
            "userId": "1",
            "createdAt": "2025-02-12T10:00:00.000Z"
        }"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.user_id, "1");
        assert_eq!(expense.amount_value(), 12.5);

        let out = serde_json::to_value(&expense).unwrap();
        assert_eq!(out["userId"], "1");
        assert_eq!(out["createdAt"], "2025-02-12T10:00:00.000Z");
    }

    #[test]
    fn test_expense_tolerates_numeric_and_missing_amount() {
        let numeric: Expense =
            serde_json::from_str(r#"{"id":"1","name":"Taxi","amount":42,"userId":"u"}"#).unwrap();
        assert_eq!(numeric.amount, "42");

        let missing: Expense =
            serde_json::from_str(r#"{"id":"2","name":"Taxi","userId":"u"}"#).unwrap();
        assert_eq!(missing.amount, "");
        assert_eq!(missing.amount_value(), 0.0);

        let null: Expense =
            serde_json::from_str(r#"{"id":"3","name":"Taxi","amount":null,"userId":"u"}"#)
                .unwrap();
        assert_eq!(null.amount_value(), 0.0);
    }

    #[test]
    fn test_list_with_incomplete_records_still_decodes() {
        let json = r#"[
            {"id":"1","name":"Food","amount":"5","userId":"A"},
            {"id":"2","name":"Taxi","amount":"3"},
            {"id":"3","amount":"4","userId":"A"}
        ]"#;
        let expenses: Vec<Expense> = serde_json::from_str(json).unwrap();
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses[1].user_id, "");
        assert_eq!(expenses[2].name, "");

        let summary = crate::budget::summarize(&expenses, "A", 100.0);
        assert_eq!(summary.total_spent, 9.0);
        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.categories[0].category, "Food");
        assert_eq!(summary.categories[1].category, crate::budget::UNCATEGORIZED);
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = ExpenseUpdate {
            amount: Some("9".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "amount": "9" }));
        assert!(!update.is_empty());
        assert!(ExpenseUpdate::default().is_empty());
    }
}
