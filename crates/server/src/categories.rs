//! Categories API endpoints.

use api_types::category::{CategoryListResponse, CategoryView};
use api_types::transaction::EntryKind as ApiKind;
use axum::{Extension, Json, extract::State};

use crate::{ServerError, account, server::ServerState};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        name: category.name,
        kind: match category.kind {
            engine::EntryKind::Income => ApiKind::Income,
            engine::EntryKind::Expense => ApiKind::Expense,
        },
    }
}

pub async fn list(
    Extension(account): Extension<account::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(account.id)
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}
