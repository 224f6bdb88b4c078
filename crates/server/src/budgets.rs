//! Budgets API endpoints.

use api_types::budget::{BudgetList, BudgetListResponse, BudgetSet, BudgetView};
use axum::{Extension, Json, extract::State};
use chrono::{Datelike, Utc};

use crate::{ServerError, account, server::ServerState};

fn map_budget(status: engine::BudgetStatus) -> BudgetView {
    BudgetView {
        category: status.category,
        year: status.year,
        month: status.month,
        cap_minor: status.cap.minor(),
        spent_minor: status.spent.minor(),
    }
}

pub async fn set(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetSet>,
) -> Result<Json<BudgetView>, ServerError> {
    let status = state
        .engine
        .set_budget(engine::SetBudgetCmd {
            account_id: account.id,
            category: payload.category,
            year: payload.year,
            month: payload.month,
            cap: engine::Money::new(payload.cap_minor),
        })
        .await?;

    Ok(Json(map_budget(status)))
}

pub async fn list(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetList>,
) -> Result<Json<BudgetListResponse>, ServerError> {
    let now = Utc::now();
    let year = payload.year.unwrap_or(now.year());
    let month = payload.month.unwrap_or(now.month());

    let budgets = state
        .engine
        .list_budgets(account.id, year, month)
        .await?
        .into_iter()
        .map(map_budget)
        .collect();

    Ok(Json(BudgetListResponse { budgets }))
}
