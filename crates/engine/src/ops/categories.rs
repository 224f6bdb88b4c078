use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};

use crate::{
    EngineError, ResultEngine,
    categories::{self, Category},
    transactions::EntryKind,
    util::{normalize_category_display, normalize_category_key},
};

use super::{Engine, accounts::require_account};

pub(super) const SEED_INCOME_CATEGORY: &str = "Salary";
pub(super) const TRANSFER_RECEIVED_CATEGORY: &str = "Transfer received";
pub(super) const TRANSFER_SENT_CATEGORY: &str = "Transfer sent";

const DEFAULT_INCOME_CATEGORIES: [&str; 3] =
    [SEED_INCOME_CATEGORY, TRANSFER_RECEIVED_CATEGORY, "Other income"];
const DEFAULT_EXPENSE_CATEGORIES: [&str; 3] =
    [TRANSFER_SENT_CATEGORY, "Purchases", "Other expense"];

impl Engine {
    /// Lists the account's categories, ordered by direction then name.
    pub async fn list_categories(&self, account_id: i64) -> ResultEngine<Vec<Category>> {
        require_account(&self.database, account_id).await?;

        let models = categories::Entity::find()
            .filter(categories::Column::AccountId.eq(account_id))
            .order_by_asc(categories::Column::Kind)
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;

        models.into_iter().map(Category::try_from).collect()
    }
}

/// Seeds the fixed category set every account starts with.
pub(super) async fn insert_default_categories<C>(
    conn: &C,
    account_id: i64,
) -> ResultEngine<Vec<categories::Model>>
where
    C: ConnectionTrait,
{
    let defaults = [
        (EntryKind::Income, DEFAULT_INCOME_CATEGORIES),
        (EntryKind::Expense, DEFAULT_EXPENSE_CATEGORIES),
    ];

    let mut created = Vec::new();
    for (kind, names) in defaults {
        for name in names {
            let Some(key) = normalize_category_key(name) else {
                continue;
            };
            let model = categories::ActiveModel {
                account_id: ActiveValue::Set(account_id),
                name: ActiveValue::Set(name.to_string()),
                name_norm: ActiveValue::Set(key),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            created.push(model);
        }
    }
    Ok(created)
}

/// Resolves the category a transfer leg is filed under.
///
/// Preference order: the account's own "Transfer sent"/"Transfer received"
/// category, then any category of the right direction, then a lazily created
/// one. A lost creation race must not fail the transfer, so the last step
/// degrades to `None` and the ledger row is written uncategorized.
pub(super) async fn resolve_transfer_category<C>(
    conn: &C,
    account_id: i64,
    kind: EntryKind,
) -> ResultEngine<Option<categories::Model>>
where
    C: ConnectionTrait,
{
    let preferred = match kind {
        EntryKind::Income => TRANSFER_RECEIVED_CATEGORY,
        EntryKind::Expense => TRANSFER_SENT_CATEGORY,
    };
    let Some(key) = normalize_category_key(preferred) else {
        return Ok(None);
    };

    let found = categories::Entity::find()
        .filter(categories::Column::AccountId.eq(account_id))
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .filter(categories::Column::NameNorm.eq(key.as_str()))
        .one(conn)
        .await?;
    if found.is_some() {
        return Ok(found);
    }

    let any_of_kind = categories::Entity::find()
        .filter(categories::Column::AccountId.eq(account_id))
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .order_by_asc(categories::Column::Id)
        .one(conn)
        .await?;
    if any_of_kind.is_some() {
        return Ok(any_of_kind);
    }

    let inserted = categories::ActiveModel {
        account_id: ActiveValue::Set(account_id),
        name: ActiveValue::Set(preferred.to_string()),
        name_norm: ActiveValue::Set(key),
        kind: ActiveValue::Set(kind.as_str().to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await;

    Ok(inserted.ok())
}

/// Resolves a user-supplied category name, creating the category when the
/// account has no match of that direction.
pub(super) async fn resolve_named_category<C>(
    conn: &C,
    account_id: i64,
    kind: EntryKind,
    name: &str,
) -> ResultEngine<categories::Model>
where
    C: ConnectionTrait,
{
    let display = normalize_category_display(name).ok_or_else(|| {
        EngineError::InvalidAmount("category name must not be empty".to_string())
    })?;
    let key = normalize_category_key(&display).ok_or_else(|| {
        EngineError::InvalidAmount("category name has no usable characters".to_string())
    })?;

    let found = categories::Entity::find()
        .filter(categories::Column::AccountId.eq(account_id))
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .filter(categories::Column::NameNorm.eq(key.as_str()))
        .one(conn)
        .await?;
    if let Some(model) = found {
        return Ok(model);
    }

    let model = categories::ActiveModel {
        account_id: ActiveValue::Set(account_id),
        name: ActiveValue::Set(display),
        name_norm: ActiveValue::Set(key),
        kind: ActiveValue::Set(kind.as_str().to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}
