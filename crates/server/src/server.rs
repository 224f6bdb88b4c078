use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{account, budgets, categories, transactions, transfers};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolves Basic credentials to an account row.
///
/// Every failure collapses into 401 so the response does not reveal whether
/// the username exists.
async fn account_for(
    credentials: &Authorization<Basic>,
    db: &DatabaseConnection,
) -> Result<account::Model, StatusCode> {
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    account::Entity::find()
        .filter(account::Column::Username.eq(credentials.username()))
        .filter(account::Column::Password.eq(credentials.password()))
        .one(db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn auth(
    credentials: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(credentials)) = credentials else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let account = account_for(&credentials, &state.db).await?;
    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/balance", get(account::balance))
        .route("/categories", get(categories::list))
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route("/transfers", post(transfers::create).get(transfers::list))
        .route("/transfers/{id}", get(transfers::detail))
        .route("/transfers/{id}/cancel", post(transfers::cancel))
        .route("/budgets", post(budgets::set).get(budgets::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub fn app(engine: Engine, db: DatabaseConnection) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => {
            if let Err(err) = run_with_listener(engine, db, listener).await {
                tracing::error!("server failed: {err}");
            }
        }
        Err(err) => tracing::error!("failed to bind server listener: {err}"),
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("ledger API listening on {addr}");

    axum::serve(listener, app(engine, db)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("ledger API stopped: {err}");
        }
    });

    Ok(addr)
}
