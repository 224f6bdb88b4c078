use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod account;
mod budgets;
mod categories;
mod server;
mod transactions;
mod transfers;

pub mod types {
    pub mod account {
        pub use api_types::account::BalanceResponse;
    }

    pub mod category {
        pub use api_types::category::{CategoryListResponse, CategoryView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            EntryKind, TransactionList, TransactionListResponse, TransactionNew, TransactionView,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{
            TransferListResponse, TransferNew, TransferState, TransferView,
        };
    }

    pub mod budget {
        pub use api_types::budget::{BudgetList, BudgetListResponse, BudgetSet, BudgetView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) | EngineError::ReceiverNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::SelfTransfer
        | EngineError::InsufficientFunds { .. }
        | EngineError::NotCancellable(_)
        | EngineError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
