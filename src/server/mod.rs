//! In-memory mock of the expense REST API.
//!
//! Serves the same routes as the hosted mock API under `/api/v1`, so the
//! client can run fully offline. `GET /expenses` can be told to answer 429
//! for its first N calls to exercise the backoff path end to end.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{Expense, ExpenseUpdate, NewExpense, User};

pub const BASE_PATH: &str = "/api/v1";

/// Data behind the mock server.
pub struct MockState {
    users: RwLock<Vec<User>>,
    expenses: RwLock<Vec<Expense>>,
    next_id: AtomicU64,
    rate_limit_remaining: AtomicU32,
}

impl MockState {
    pub fn new(users: Vec<User>, expenses: Vec<Expense>) -> Self {
        let max_id = expenses
            .iter()
            .filter_map(|e| e.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            users: RwLock::new(users),
            expenses: RwLock::new(expenses),
            next_id: AtomicU64::new(max_id + 1),
            rate_limit_remaining: AtomicU32::new(0),
        }
    }

    /// A demo user (`demo@example.com` / `password`) with a few expenses.
    pub fn with_demo_data() -> Self {
        let created_at = timestamp();
        let user = |id: &str, username: &str| User {
            id: id.to_string(),
            username: username.to_string(),
            password: "password".to_string(),
            created_at: created_at.clone(),
        };
        let expense = |id: &str, user_id: &str, name: &str, amount: &str, description: &str| {
            Expense {
                id: id.to_string(),
                name: name.to_string(),
                amount: amount.to_string(),
                description: description.to_string(),
                user_id: user_id.to_string(),
                created_at: created_at.clone(),
            }
        };

        Self::new(
            vec![user("1", "demo@example.com"), user("2", "other@example.com")],
            vec![
                expense("1", "1", "Food Lunch", "12.50", "Noodle bar"),
                expense("2", "1", "Food Groceries", "64.20", "Weekly shop"),
                expense("3", "1", "Transport Bus", "2.75", "Single fare"),
                expense("4", "1", "Rent March", "850", "Apartment"),
                expense("5", "2", "Food Dinner", "30", "Not yours"),
            ],
        )
    }

    /// Answer the next `count` expense listings with 429.
    pub fn rate_limited(self, count: u32) -> Self {
        self.rate_limit_remaining.store(count, Ordering::SeqCst);
        self
    }

    fn take_rate_limit(&self) -> bool {
        self.rate_limit_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Build the router, with every route nested under [`BASE_PATH`].
pub fn router(state: Arc<MockState>) -> Router {
    let api = Router::new()
        .route("/users", get(list_users))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .with_state(state);

    Router::new()
        .nest(BASE_PATH, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: SocketAddr, state: Arc<MockState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Mock expense API listening on http://{}{}",
        listener.local_addr()?,
        BASE_PATH
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    username: Option<String>,
}

async fn list_users(
    State(state): State<Arc<MockState>>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<User>> {
    let users = state.users.read().await;
    let matching = users
        .iter()
        .filter(|u| query.username.as_deref().map_or(true, |name| u.username == name))
        .cloned()
        .collect();
    Json(matching)
}

async fn list_expenses(State(state): State<Arc<MockState>>) -> Response {
    if state.take_rate_limit() {
        tracing::warn!("Injecting 429 for GET /expenses");
        return (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    }
    Json(state.expenses.read().await.clone()).into_response()
}

async fn get_expense(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, (StatusCode, &'static str)> {
    state
        .expenses
        .read()
        .await
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn create_expense(
    State(state): State<Arc<MockState>>,
    Json(body): Json<NewExpense>,
) -> (StatusCode, Json<Expense>) {
    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let expense = Expense {
        id: id.to_string(),
        name: body.name,
        amount: body.amount,
        description: body.description,
        user_id: body.user_id,
        created_at: timestamp(),
    };
    state.expenses.write().await.push(expense.clone());
    tracing::debug!(id, "Created expense");
    (StatusCode::CREATED, Json(expense))
}

async fn update_expense(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, (StatusCode, &'static str)> {
    let mut expenses = state.expenses.write().await;
    let expense = expenses.iter_mut().find(|e| e.id == id).ok_or_else(not_found)?;
    update.apply_to(expense);
    Ok(Json(expense.clone()))
}

async fn delete_expense(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, (StatusCode, &'static str)> {
    let mut expenses = state.expenses.write().await;
    let index = expenses.iter().position(|e| e.id == id).ok_or_else(not_found)?;
    Ok(Json(expenses.remove(index)))
}
