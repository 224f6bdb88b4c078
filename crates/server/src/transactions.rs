//! Ledger entry API endpoints.

use api_types::transaction::{
    EntryKind as ApiKind, TransactionList, TransactionListResponse, TransactionNew,
    TransactionView,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{ServerError, account, server::ServerState};

fn map_kind(kind: engine::EntryKind) -> ApiKind {
    match kind {
        engine::EntryKind::Income => ApiKind::Income,
        engine::EntryKind::Expense => ApiKind::Expense,
    }
}

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount.minor(),
        category: tx.category,
        description: tx.description,
        occurred_at: tx.occurred_at,
    }
}

pub async fn create(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let kind = match payload.kind {
        ApiKind::Income => engine::EntryKind::Income,
        ApiKind::Expense => engine::EntryKind::Expense,
    };

    let tx = state
        .engine
        .record_transaction(engine::RecordTransactionCmd {
            account_id: account.id,
            kind,
            amount: engine::Money::new(payload.amount_minor),
            category: payload.category,
            description: payload.description,
            occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn list(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);

    let transactions = state
        .engine
        .list_transactions(account.id, limit)
        .await?
        .into_iter()
        .map(map_transaction)
        .collect();

    Ok(Json(TransactionListResponse { transactions }))
}
