//! Scripted in-memory API used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ApiError, Expense, ExpenseApi, ExpenseUpdate, NewExpense, User};

/// Scripted reply for one `list_expenses` call.
pub(crate) struct ListReply {
    pub delay: Duration,
    pub result: Result<Vec<Expense>, ApiError>,
}

impl ListReply {
    pub fn ok(expenses: Vec<Expense>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(expenses),
        }
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replays queued `list_expenses` results, then falls back to the stored list.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    pub users: Mutex<Vec<User>>,
    pub expenses: Mutex<Vec<Expense>>,
    list_replies: Mutex<VecDeque<ListReply>>,
    list_calls: Mutex<Vec<Instant>>,
    fail_writes: Mutex<Option<ApiError>>,
    next_id: Mutex<u64>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        *self.users.lock().unwrap() = users;
        self
    }

    pub fn with_expenses(self, expenses: Vec<Expense>) -> Self {
        *self.expenses.lock().unwrap() = expenses;
        self
    }

    pub fn push_list(&self, reply: ListReply) {
        self.list_replies.lock().unwrap().push_back(reply);
    }

    pub fn fail_writes_with(&self, error: ApiError) {
        *self.fail_writes.lock().unwrap() = Some(error);
    }

    pub fn list_calls(&self) -> Vec<Instant> {
        self.list_calls.lock().unwrap().clone()
    }

    fn write_guard(&self) -> Result<(), ApiError> {
        match self.fail_writes.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub(crate) fn user(id: &str, username: &str, password: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        password: password.to_string(),
        created_at: "2025-02-12T00:00:00.000Z".to_string(),
    }
}

pub(crate) fn expense(id: &str, user_id: &str, name: &str, amount: &str) -> Expense {
    Expense {
        id: id.to_string(),
        name: name.to_string(),
        amount: amount.to_string(),
        description: format!("{} description", name),
        user_id: user_id.to_string(),
        created_at: "2025-02-12T00:00:00.000Z".to_string(),
    }
}

#[async_trait]
impl ExpenseApi for ScriptedApi {
    async fn find_users(&self, username: &str) -> Result<Vec<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.username == username)
            .cloned()
            .collect())
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>, ApiError> {
        self.list_calls.lock().unwrap().push(Instant::now());
        let reply = self.list_replies.lock().unwrap().pop_front();
        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Ok(self.expenses.lock().unwrap().clone()),
        }
    }

    async fn get_expense(&self, id: &str) -> Result<Expense, ApiError> {
        self.expenses
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Not found"))
    }

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        self.write_guard()?;
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("new-{}", next)
        };
        let created = Expense {
            id,
            name: expense.name.clone(),
            amount: expense.amount.clone(),
            description: expense.description.clone(),
            user_id: expense.user_id.clone(),
            created_at: "2025-02-12T00:00:00.000Z".to_string(),
        };
        self.expenses.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_expense(&self, id: &str, update: &ExpenseUpdate) -> Result<Expense, ApiError> {
        self.write_guard()?;
        let mut expenses = self.expenses.lock().unwrap();
        let expense = expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ApiError::from_status(404, "Not found"))?;
        update.apply_to(expense);
        Ok(expense.clone())
    }

    async fn delete_expense(&self, id: &str) -> Result<(), ApiError> {
        self.write_guard()?;
        let mut expenses = self.expenses.lock().unwrap();
        let before = expenses.len();
        expenses.retain(|e| e.id != id);
        if expenses.len() == before {
            return Err(ApiError::from_status(404, "Not found"));
        }
        Ok(())
    }
}
