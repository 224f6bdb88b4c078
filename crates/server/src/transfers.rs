//! Transfers API endpoints.

use std::collections::HashMap;

use api_types::transfer::{
    TransferListResponse, TransferNew, TransferState as ApiState, TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, account, server::ServerState};

fn map_state(state: engine::TransferState) -> ApiState {
    match state {
        engine::TransferState::Pending => ApiState::Pending,
        engine::TransferState::Completed => ApiState::Completed,
        engine::TransferState::Failed => ApiState::Failed,
        engine::TransferState::Cancelled => ApiState::Cancelled,
    }
}

fn map_transfer(transfer: engine::Transfer, usernames: &HashMap<i64, String>) -> TransferView {
    TransferView {
        id: transfer.id,
        reference: transfer.reference,
        sender: usernames
            .get(&transfer.sender_id)
            .cloned()
            .unwrap_or_default(),
        receiver: usernames
            .get(&transfer.receiver_id)
            .cloned()
            .unwrap_or_default(),
        amount_minor: transfer.amount.minor(),
        memo: transfer.memo,
        state: map_state(transfer.state),
        created_at: transfer.created_at,
        processed_at: transfer.processed_at,
    }
}

pub async fn create(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let transfer = state
        .engine
        .execute_transfer(engine::TransferCmd {
            sender_id: account.id,
            receiver_username: payload.receiver.clone(),
            amount: engine::Money::new(payload.amount_minor),
            memo: payload.memo,
        })
        .await?;

    // Both usernames are already known here; skip the lookup.
    let mut usernames = HashMap::new();
    usernames.insert(transfer.sender_id, account.username);
    usernames.insert(transfer.receiver_id, payload.receiver);

    Ok((
        StatusCode::CREATED,
        Json(map_transfer(transfer, &usernames)),
    ))
}

pub async fn list(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
) -> Result<Json<TransferListResponse>, ServerError> {
    let lists = state.engine.list_transfers(account.id).await?;

    let mut ids: Vec<i64> = lists
        .sent
        .iter()
        .chain(lists.received.iter())
        .flat_map(|transfer| [transfer.sender_id, transfer.receiver_id])
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let usernames = state.engine.usernames(&ids).await?;

    let sent = lists
        .sent
        .into_iter()
        .map(|transfer| map_transfer(transfer, &usernames))
        .collect();
    let received = lists
        .received
        .into_iter()
        .map(|transfer| map_transfer(transfer, &usernames))
        .collect();

    Ok(Json(TransferListResponse { sent, received }))
}

pub async fn detail(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferView>, ServerError> {
    let transfer = state.engine.transfer(account.id, transfer_id).await?;
    let usernames = state
        .engine
        .usernames(&[transfer.sender_id, transfer.receiver_id])
        .await?;

    Ok(Json(map_transfer(transfer, &usernames)))
}

pub async fn cancel(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferView>, ServerError> {
    let transfer = state
        .engine
        .cancel_transfer(account.id, transfer_id)
        .await?;
    let usernames = state
        .engine
        .usernames(&[transfer.sender_id, transfer.receiver_id])
        .await?;

    Ok(Json(map_transfer(transfer, &usernames)))
}
