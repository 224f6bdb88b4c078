//! Account row used by the auth middleware, plus the balance endpoint.

use api_types::account::BalanceResponse;
use axum::{Extension, Json, extract::State};
use sea_orm::entity::prelude::*;

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub created_at: DateTimeUtc,
    pub lock_generation: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Current balance of the authenticated account.
pub async fn balance(
    Extension(account): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let balance = state.engine.balance_of(account.id).await?;

    Ok(Json(BalanceResponse {
        balance_minor: balance.minor(),
    }))
}
