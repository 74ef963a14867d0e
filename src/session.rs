//! Session state: the logged-in user and the monthly budget.
//!
//! A [`Session`] is loaded once at startup, changed only through its
//! methods, and passed explicitly to whatever needs it. Every change is
//! written through to the [`KeyValueStore`] before memory is updated.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, ExpenseApi, User};
use crate::store::{KeyValueStore, StoreError, BUDGET_KEY, USER_KEY};
use crate::validation::{validate_budget, ValidationError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("An error occurred. Please try again.")]
    Remote(#[source] ApiError),

    #[error("Failed to save budget")]
    SaveBudget(#[source] StoreError),

    #[error("Failed to update session storage: {0}")]
    Store(#[from] StoreError),
}

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    user: Option<User>,
    monthly_budget: f64,
}

impl Session {
    /// Restore the session from `store`.
    ///
    /// Unreadable or corrupt values are logged and treated as absent.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let user = match store.get(USER_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::error!("Error loading user: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Error loading user: {}", e);
                None
            }
        };

        let monthly_budget = match store.get(BUDGET_KEY).await {
            Ok(Some(raw)) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or_else(|| {
                    tracing::warn!("Ignoring unreadable stored budget {:?}", raw);
                    0.0
                }),
            Ok(None) => 0.0,
            Err(e) => {
                tracing::error!("Error loading budget: {}", e);
                0.0
            }
        };

        Self {
            store,
            user,
            monthly_budget,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn monthly_budget(&self) -> f64 {
        self.monthly_budget
    }

    /// Username up to the first `@`.
    pub fn display_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.username.split('@').next().unwrap_or(&u.username))
    }

    /// Log in as the first user the API returns whose password matches.
    ///
    /// The comparison is an exact, case-sensitive plaintext match against
    /// data served by the API. It is not a security boundary.
    pub async fn login(
        &mut self,
        api: &dyn ExpenseApi,
        username: &str,
        password: &str,
    ) -> Result<&User, SessionError> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }

        let users = match api.find_users(username).await {
            Ok(users) => users,
            // mockapi answers 404 when a filter matches nothing.
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                tracing::error!("Login request failed: {}", e);
                return Err(SessionError::Remote(e));
            }
        };

        let user = match users.into_iter().find(|u| u.password == password) {
            Some(user) => user,
            None => {
                tracing::info!(username, "Rejected login");
                return Err(SessionError::InvalidCredentials);
            }
        };

        let serialized = serde_json::to_string(&user).map_err(StoreError::from)?;
        self.store.set(USER_KEY, &serialized).await?;
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(self.user.insert(user))
    }

    /// Forget the logged-in user. The budget is kept.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.store.remove(USER_KEY).await?;
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user.id, "Logged out");
        }
        Ok(())
    }

    /// Validate and persist a new monthly budget, returning its value.
    pub async fn set_monthly_budget(&mut self, input: &str) -> Result<f64, SessionError> {
        let amount = validate_budget(input)?;
        self.store
            .set(BUDGET_KEY, &amount.to_string())
            .await
            .map_err(|e| {
                tracing::error!("Error saving budget: {}", e);
                SessionError::SaveBudget(e)
            })?;
        self.monthly_budget = amount;
        Ok(amount)
    }
}
