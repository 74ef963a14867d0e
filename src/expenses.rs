//! Expense list, detail and add controllers.
//!
//! [`ExpenseList`] owns the locally held copy of the expense list. Its
//! refreshes go through [`BackoffFetcher`] and are not serialized: when two
//! refreshes overlap, whichever response resolves last overwrites the list,
//! even if it was requested first.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

use crate::api::{ApiError, Expense, ExpenseApi, ExpenseUpdate, NewExpense};
use crate::fetch::{BackoffFetcher, FetchEvent, RetryConfig};
use crate::session::Session;
use crate::validation::{validate_expense, validate_update, ValidationError};

pub const QUICK_ADD_NAME: &str = "New Expense";
pub const QUICK_ADD_AMOUNT: &str = "0";
pub const QUICK_ADD_DESCRIPTION: &str = "Click to edit";

#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("You must be logged in to add expenses")]
    NotLoggedIn,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to load expense details")]
    Load(#[source] ApiError),

    #[error("Failed to create expense")]
    Create(#[source] ApiError),

    #[error("Failed to add expense")]
    QuickAdd(#[source] ApiError),

    #[error("Failed to update expense")]
    Update(#[source] ApiError),

    #[error("Failed to delete expense")]
    Delete(#[source] ApiError),
}

/// Snapshot of the expense list screen.
#[derive(Debug, Clone, Default)]
pub struct ExpenseListState {
    pub expenses: Vec<Expense>,
    /// User-facing message of the last failed refresh.
    pub error: Option<String>,
    pub is_loading: bool,
    /// Attempt count the last failed refresh stopped at.
    pub retry_count: u32,
}

#[derive(Clone)]
pub struct ExpenseList {
    api: Arc<dyn ExpenseApi>,
    fetcher: BackoffFetcher,
    state: Arc<RwLock<ExpenseListState>>,
}

impl ExpenseList {
    pub fn new(api: Arc<dyn ExpenseApi>, retry: RetryConfig) -> Self {
        Self {
            fetcher: BackoffFetcher::new(Arc::clone(&api), retry),
            api,
            state: Arc::new(RwLock::new(ExpenseListState::default())),
        }
    }

    /// Retry status lines published while a refresh backs off.
    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.fetcher.subscribe()
    }

    pub async fn snapshot(&self) -> ExpenseListState {
        self.state.read().await.clone()
    }

    /// Label for the manual retry action.
    pub async fn retry_label(&self) -> &'static str {
        if self.state.read().await.retry_count < self.fetcher.config().max_retries {
            "Retry"
        } else {
            "Try Again"
        }
    }

    /// Reload the list from scratch.
    pub async fn refresh(&self) {
        self.fetch_from(0).await;
    }

    /// Reload, resuming the retry counter where the last failure left it.
    pub async fn retry(&self) {
        let attempt = self.state.read().await.retry_count;
        self.fetch_from(attempt).await;
    }

    async fn fetch_from(&self, attempt: u32) {
        self.state.write().await.is_loading = true;

        let result = self.fetcher.fetch(attempt).await;

        let mut state = self.state.write().await;
        match result {
            Ok(expenses) => {
                state.expenses = expenses;
                state.error = None;
                state.retry_count = 0;
            }
            Err(err) => {
                state.error = Some(err.to_string());
                state.retry_count = err.attempt();
            }
        }
        state.is_loading = false;
    }

    /// Expenses matching `query`, see [`filter_expenses`].
    pub async fn search(&self, query: &str) -> Vec<Expense> {
        let state = self.state.read().await;
        filter_expenses(&state.expenses, query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Create a placeholder expense for the logged-in user and show it first.
    pub async fn quick_add(&self, session: &Session) -> Result<Expense, ExpenseError> {
        let user_id = session.user_id().ok_or(ExpenseError::NotLoggedIn)?;

        let created = self
            .api
            .create_expense(&NewExpense {
                name: QUICK_ADD_NAME.to_string(),
                amount: QUICK_ADD_AMOUNT.to_string(),
                description: QUICK_ADD_DESCRIPTION.to_string(),
                user_id: user_id.to_string(),
            })
            .await
            .map_err(ExpenseError::QuickAdd)?;

        self.state.write().await.expenses.insert(0, created.clone());
        Ok(created)
    }
}

/// Case-insensitive search over name, amount and description.
///
/// A blank query matches everything.
pub fn filter_expenses<'a>(expenses: &'a [Expense], query: &str) -> Vec<&'a Expense> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return expenses.iter().collect();
    }
    expenses
        .iter()
        .filter(|e| {
            e.name.to_lowercase().contains(&query)
                || e.amount.contains(&query)
                || e.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// Single-expense operations: detail, add, edit, delete.
#[derive(Clone)]
pub struct ExpenseEditor {
    api: Arc<dyn ExpenseApi>,
}

impl ExpenseEditor {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self { api }
    }

    pub async fn load(&self, id: &str) -> Result<Expense, ExpenseError> {
        self.api.get_expense(id).await.map_err(|e| {
            tracing::error!(id, "Failed to load expense: {}", e);
            ExpenseError::Load(e)
        })
    }

    /// Validate and create an expense owned by the logged-in user.
    pub async fn create(
        &self,
        session: &Session,
        name: &str,
        amount: &str,
        description: &str,
    ) -> Result<Expense, ExpenseError> {
        let user_id = session.user_id().ok_or(ExpenseError::NotLoggedIn)?;
        let expense = NewExpense {
            name: name.to_string(),
            amount: amount.to_string(),
            description: description.to_string(),
            user_id: user_id.to_string(),
        };
        validate_expense(&expense)?;

        let created = self
            .api
            .create_expense(&expense)
            .await
            .map_err(ExpenseError::Create)?;
        tracing::info!(id = %created.id, "Created expense");
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: &ExpenseUpdate) -> Result<Expense, ExpenseError> {
        validate_update(update)?;
        self.api.update_expense(id, update).await.map_err(|e| {
            tracing::error!(id, "Failed to update expense: {}", e);
            ExpenseError::Update(e)
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), ExpenseError> {
        self.api.delete_expense(id).await.map_err(|e| {
            tracing::error!(id, "Failed to delete expense: {}", e);
            ExpenseError::Delete(e)
        })?;
        tracing::info!(id, "Deleted expense");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{expense, user, ListReply, ScriptedApi};
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn rate_limited() -> ApiError {
        ApiError::from_status(429, "")
    }

    async fn logged_in(api: &ScriptedApi) -> Session {
        let mut session = Session::load(Arc::new(MemoryStore::new())).await;
        session.login(api, "ada", "secret1").await.unwrap();
        session
    }

    fn scripted() -> Arc<ScriptedApi> {
        Arc::new(ScriptedApi::new().with_users(vec![user("1", "ada", "secret1")]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_success_clears_error() {
        let api = scripted();
        api.push_list(ListReply::err(ApiError::network("down")));
        api.push_list(ListReply::ok(vec![expense("1", "1", "Food", "3")]));
        let list = ExpenseList::new(api.clone(), RetryConfig::default());

        list.refresh().await;
        let state = list.snapshot().await;
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to fetch expenses. Please try again.")
        );
        assert!(!state.is_loading);

        list.retry().await;
        let state = list.snapshot().await;
        assert_eq!(state.error, None);
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.expenses.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_rate_limit_then_manual_retry() {
        let api = scripted();
        for _ in 0..4 {
            api.push_list(ListReply::err(rate_limited()));
        }
        let list = ExpenseList::new(api.clone(), RetryConfig::default());

        list.refresh().await;
        let state = list.snapshot().await;
        assert_eq!(
            state.error.as_deref(),
            Some("Too many requests. Please try again later.")
        );
        assert_eq!(state.retry_count, 3);
        assert_eq!(list.retry_label().await, "Try Again");

        // Manual retry resumes at attempt 3: one request, no backoff.
        api.push_list(ListReply::err(rate_limited()));
        let start = tokio::time::Instant::now();
        list.retry().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(api.list_calls().len(), 5);
        assert_eq!(list.snapshot().await.retry_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_label_before_ceiling() {
        let api = scripted();
        api.push_list(ListReply::err(ApiError::from_status(500, "")));
        let list = ExpenseList::new(api, RetryConfig::default());
        list.refresh().await;
        assert_eq!(list.retry_label().await, "Retry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_last_response_wins() {
        let api = scripted();
        api.push_list(
            ListReply::ok(vec![expense("old", "1", "Stale", "1")]).after(Duration::from_millis(300)),
        );
        api.push_list(
            ListReply::ok(vec![expense("new", "1", "Fresh", "2")]).after(Duration::from_millis(100)),
        );
        let list = ExpenseList::new(api, RetryConfig::default());

        // The first refresh is issued first but resolves last.
        tokio::join!(list.refresh(), list.refresh());

        let state = list.snapshot().await;
        assert_eq!(state.expenses.len(), 1);
        assert_eq!(state.expenses[0].id, "old");
    }

    #[test]
    fn test_filter_expenses() {
        let expenses = vec![
            expense("1", "1", "Food Lunch", "12.50"),
            expense("2", "1", "Taxi", "30"),
            Expense {
                description: "Airport RIDE".to_string(),
                ..expense("3", "1", "Uber", "45")
            },
        ];

        let ids = |q: &str| -> Vec<String> {
            filter_expenses(&expenses, q)
                .into_iter()
                .map(|e| e.id.clone())
                .collect()
        };

        assert_eq!(ids(""), vec!["1", "2", "3"]);
        assert_eq!(ids("   "), vec!["1", "2", "3"]);
        assert_eq!(ids("  food "), vec!["1"]);
        assert_eq!(ids("12.5"), vec!["1"]);
        assert_eq!(ids("ride"), vec!["3"]);
        assert!(ids("nothing").is_empty());
    }

    #[tokio::test]
    async fn test_quick_add_prepends_placeholder() {
        let api = scripted();
        let list = ExpenseList::new(api.clone(), RetryConfig::default());
        let session = logged_in(&api).await;

        list.refresh().await;
        let created = list.quick_add(&session).await.unwrap();
        assert_eq!(created.name, QUICK_ADD_NAME);
        assert_eq!(created.amount, "0");
        assert_eq!(created.user_id, "1");
        assert_eq!(list.snapshot().await.expenses[0].id, created.id);
    }

    #[tokio::test]
    async fn test_quick_add_requires_login() {
        let api = scripted();
        let list = ExpenseList::new(api, RetryConfig::default());
        let session = Session::load(Arc::new(MemoryStore::new())).await;

        let err = list.quick_add(&session).await.unwrap_err();
        assert_eq!(err.to_string(), "You must be logged in to add expenses");
    }

    #[tokio::test]
    async fn test_editor_create_validates_before_sending() {
        let api = scripted();
        let editor = ExpenseEditor::new(api.clone());
        let session = logged_in(&api).await;

        let err = editor.create(&session, "Taxi", "abc", "ride").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid amount");
        assert!(api.expenses.lock().unwrap().is_empty());

        let created = editor.create(&session, "Taxi", "12", "ride").await.unwrap();
        assert_eq!(created.user_id, "1");
        assert_eq!(api.expenses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_editor_update_and_delete() {
        let api = Arc::new(ScriptedApi::new().with_expenses(vec![expense("9", "1", "Taxi", "10")]));
        let editor = ExpenseEditor::new(api.clone());

        let loaded = editor.load("9").await.unwrap();
        assert_eq!(loaded.name, "Taxi");

        let updated = editor
            .update(
                "9",
                &ExpenseUpdate {
                    name: Some("Taxi Home".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Taxi Home");
        assert_eq!(updated.amount, "10");

        editor.delete("9").await.unwrap();
        let err = editor.load("9").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load expense details");
        let err = editor.delete("9").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete expense");
    }

    #[tokio::test]
    async fn test_editor_surfaces_remote_failures() {
        let api = scripted();
        let editor = ExpenseEditor::new(api.clone());
        let session = logged_in(&api).await;
        api.fail_writes_with(ApiError::timeout());

        let err = editor.create(&session, "Taxi", "5", "ride").await.unwrap_err();
        assert!(matches!(err, ExpenseError::Create(_)));
        assert_eq!(err.to_string(), "Failed to create expense");

        let err = editor
            .update(
                "x",
                &ExpenseUpdate {
                    amount: Some("3".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to update expense");
    }
}
