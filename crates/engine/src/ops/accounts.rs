use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    CreateAccountCmd, EngineError, LedgerEvent, ResultEngine,
    accounts::{self, Account},
    transactions::{self, EntryKind},
};

use super::{
    Engine,
    categories::{SEED_INCOME_CATEGORY, insert_default_categories},
    normalize_required_name, with_tx,
};

impl Engine {
    /// Creates an account together with its default categories.
    ///
    /// The username is both the login and the transfer handle, so it must be
    /// unique. A `seed_income` amount posts an opening entry against the
    /// default income category; the balance itself stays ledger-derived.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultEngine<Account> {
        let CreateAccountCmd {
            username,
            password,
            display_name,
            seed_income,
        } = cmd;
        let username = normalize_required_name(&username, "username")?;
        let display_name = normalize_required_name(&display_name, "display name")?;
        if password.is_empty() {
            return Err(EngineError::InvalidAmount(
                "password must not be empty".to_string(),
            ));
        }
        if let Some(amount) = seed_income
            && !amount.is_positive()
        {
            return Err(EngineError::InvalidAmount(
                "seed income must be > 0".to_string(),
            ));
        }

        let model: accounts::Model = with_tx!(self, |db_tx| {
            let existing = accounts::Entity::find()
                .filter(accounts::Column::Username.eq(username.as_str()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(username));
            }

            let account_model = accounts::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password.clone()),
                display_name: ActiveValue::Set(display_name.clone()),
                created_at: ActiveValue::Set(Utc::now()),
                lock_generation: ActiveValue::Set(0),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            let defaults = insert_default_categories(&db_tx, account_model.id).await?;

            if let Some(amount) = seed_income {
                let salary = defaults.iter().find(|category| {
                    category.kind == EntryKind::Income.as_str()
                        && category.name == SEED_INCOME_CATEGORY
                });
                transactions::ActiveModel {
                    account_id: ActiveValue::Set(account_model.id),
                    category_id: ActiveValue::Set(salary.map(|category| category.id)),
                    kind: ActiveValue::Set(EntryKind::Income.as_str().to_string()),
                    amount_minor: ActiveValue::Set(amount.minor()),
                    description: ActiveValue::Set(Some("Opening balance".to_string())),
                    occurred_at: ActiveValue::Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
            }

            Ok(account_model)
        })?;

        self.emit(LedgerEvent::AccountCreated {
            account_id: model.id,
            username: model.username.clone(),
        });
        Ok(Account::from(model))
    }

    /// Looks an account up by its username.
    pub async fn account_by_username(&self, username: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Ok(Account::from(model))
    }

    /// Maps account ids to usernames for view rendering.
    pub async fn usernames(&self, ids: &[i64]) -> ResultEngine<HashMap<i64, String>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().copied()))
            .all(&self.database)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| (model.id, model.username))
            .collect())
    }

    /// Lists every account, ordered by username.
    pub async fn list_accounts(&self) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Username)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }
}

pub(super) async fn require_account<C>(conn: &C, account_id: i64) -> ResultEngine<accounts::Model>
where
    C: ConnectionTrait,
{
    accounts::Entity::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
}
