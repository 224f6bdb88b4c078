use chrono::Utc;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, LedgerEvent, RecordTransactionCmd, ResultEngine, Transaction, categories,
    transactions,
};

use super::{
    Engine, accounts::require_account, categories::resolve_named_category, normalize_optional_text,
    with_tx,
};

impl Engine {
    /// Records a single income or expense entry on an account.
    ///
    /// The category is resolved by normalized name within the entry's
    /// direction and created on first use; entries without a category are
    /// allowed.
    pub async fn record_transaction(
        &self,
        cmd: RecordTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let RecordTransactionCmd {
            account_id,
            kind,
            amount,
            category,
            description,
            occurred_at,
        } = cmd;
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "entry amount must be > 0".to_string(),
            ));
        }
        let category = normalize_optional_text(category.as_deref());
        let description = normalize_optional_text(description.as_deref());
        let occurred_at = occurred_at.unwrap_or_else(Utc::now);

        let (model, category_name) = with_tx!(self, |db_tx| {
            require_account(&db_tx, account_id).await?;

            let category_model = match category.as_deref() {
                Some(name) => {
                    Some(resolve_named_category(&db_tx, account_id, kind, name).await?)
                }
                None => None,
            };

            let model = transactions::ActiveModel {
                account_id: ActiveValue::Set(account_id),
                category_id: ActiveValue::Set(
                    category_model.as_ref().map(|category| category.id),
                ),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(amount.minor()),
                description: ActiveValue::Set(description.clone()),
                occurred_at: ActiveValue::Set(occurred_at),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            Ok((model, category_model.map(|category| category.name)))
        })?;

        self.emit(LedgerEvent::TransactionRecorded {
            account_id,
            transaction_id: model.id,
        });
        Transaction::try_from_models(model, category_name)
    }

    /// Lists the account's ledger entries, newest first.
    pub async fn list_transactions(
        &self,
        account_id: i64,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        require_account(&self.database, account_id).await?;

        let rows = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?;

        rows.into_iter()
            .map(|(model, category)| {
                Transaction::try_from_models(model, category.map(|category| category.name))
            })
            .collect()
    }
}
