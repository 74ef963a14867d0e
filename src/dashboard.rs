//! Dashboard controller: budget, totals and spending by category.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::{Expense, ExpenseApi};
use crate::budget::{
    check_budget_alert, summarize, BudgetAlert, CategoryBucket, CategoryPager, SpendingSummary,
};
use crate::session::{Session, SessionError};

/// Everything needed to render the dashboard once.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub summary: SpendingSummary,
    pub visible_categories: Vec<CategoryBucket>,
    pub can_show_more: bool,
    pub can_show_less: bool,
}

#[derive(Debug, Default)]
struct DashboardState {
    /// Expenses of the logged-in user from the last successful refresh.
    expenses: Vec<Expense>,
    pager: CategoryPager,
}

#[derive(Clone)]
pub struct Dashboard {
    api: Arc<dyn ExpenseApi>,
    state: Arc<RwLock<DashboardState>>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(DashboardState::default())),
        }
    }

    /// Reload the user's expenses and recompute the budget.
    ///
    /// Uses the plain list endpoint. A failed fetch is logged and the
    /// previous expenses are kept. Returns an alert when the recomputed
    /// remaining budget is low.
    pub async fn refresh(&self, session: &Session) -> Option<BudgetAlert> {
        let user_id = session.user_id()?;

        match self.api.list_expenses().await {
            Ok(all) => {
                let owned: Vec<Expense> =
                    all.into_iter().filter(|e| e.user_id == user_id).collect();
                tracing::debug!(count = owned.len(), "Dashboard refreshed");
                self.state.write().await.expenses = owned;
            }
            Err(e) => tracing::error!("Error fetching expenses: {}", e),
        }

        self.recompute(session).await
    }

    /// Set a new monthly budget and recompute.
    pub async fn set_budget(
        &self,
        session: &mut Session,
        input: &str,
    ) -> Result<Option<BudgetAlert>, SessionError> {
        session.set_monthly_budget(input).await?;
        Ok(self.recompute(session).await)
    }

    async fn recompute(&self, session: &Session) -> Option<BudgetAlert> {
        let remaining = self.summary(session).await.remaining;
        let alert = check_budget_alert(remaining);
        if let Some(alert) = &alert {
            tracing::info!(remaining = alert.remaining, "Budget alert");
        }
        alert
    }

    async fn summary(&self, session: &Session) -> SpendingSummary {
        let state = self.state.read().await;
        let user_id = session.user_id().unwrap_or_default();
        summarize(&state.expenses, user_id, session.monthly_budget())
    }

    pub async fn view(&self, session: &Session) -> DashboardView {
        let summary = self.summary(session).await;
        let pager = self.state.read().await.pager;
        let total = summary.categories.len();
        DashboardView {
            visible_categories: pager.visible(&summary.categories).to_vec(),
            can_show_more: pager.can_show_more(total),
            can_show_less: pager.can_show_less(),
            summary,
        }
    }

    /// Reveal another page of categories. Returns false if nothing was hidden.
    pub async fn show_more(&self, session: &Session) -> bool {
        let total = self.summary(session).await.categories.len();
        self.state.write().await.pager.show_more(total)
    }

    pub async fn show_less(&self) {
        self.state.write().await.pager.show_less();
    }
}
