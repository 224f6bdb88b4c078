use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, LedgerEvent, ResultEngine, Transfer, TransferCmd, accounts,
    transactions::{self, EntryKind},
    transfers,
};

use super::{
    Engine, accounts::require_account, balances::balance_on,
    categories::resolve_transfer_category, normalize_optional_text, with_tx,
};

/// Sent and received transfers for one account, newest first.
#[derive(Clone, Debug, Default)]
pub struct TransferLists {
    pub sent: Vec<Transfer>,
    pub received: Vec<Transfer>,
}

impl Engine {
    /// Executes a transfer from `sender_id` to the receiver username.
    ///
    /// Validation happens before any lock is taken. The atomic section then
    /// locks the two participant rows in ascending id order, re-reads the
    /// sender balance under that lock, writes the transfer row and its
    /// mirrored ledger entries, and completes the transfer. Everything
    /// becomes visible in a single commit; any rejection rolls the whole
    /// section back.
    pub async fn execute_transfer(&self, cmd: TransferCmd) -> ResultEngine<Transfer> {
        let TransferCmd {
            sender_id,
            receiver_username,
            amount,
            memo,
        } = cmd;
        let memo = normalize_optional_text(memo.as_deref());

        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "transfer amount must be > 0".to_string(),
            ));
        }
        let sender = require_account(&self.database, sender_id).await?;
        let receiver = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(receiver_username.as_str()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::ReceiverNotFound(receiver_username))?;
        if receiver.id == sender.id {
            return Err(EngineError::SelfTransfer);
        }

        let _lane = self
            .transfer_locks
            .acquire(sender.id, receiver.id, self.lock_wait)
            .await?;

        let transfer: Transfer = with_tx!(self, |db_tx| {
            lock_account_rows(&db_tx, sender.id, receiver.id).await?;

            let balance = balance_on(&db_tx, sender.id).await?;
            if balance < amount {
                return Err(EngineError::InsufficientFunds { balance });
            }

            let mut transfer = Transfer::new(sender.id, receiver.id, amount, memo.clone())?;
            transfers::ActiveModel::from(&transfer).insert(&db_tx).await?;

            let sender_category =
                resolve_transfer_category(&db_tx, sender.id, EntryKind::Expense).await?;
            let receiver_category =
                resolve_transfer_category(&db_tx, receiver.id, EntryKind::Income).await?;

            let occurred_at = Utc::now();
            transactions::ActiveModel {
                account_id: ActiveValue::Set(sender.id),
                category_id: ActiveValue::Set(sender_category.map(|category| category.id)),
                kind: ActiveValue::Set(EntryKind::Expense.as_str().to_string()),
                amount_minor: ActiveValue::Set(amount.minor()),
                description: ActiveValue::Set(Some(sent_description(
                    &receiver.username,
                    memo.as_deref(),
                ))),
                occurred_at: ActiveValue::Set(occurred_at),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            transactions::ActiveModel {
                account_id: ActiveValue::Set(receiver.id),
                category_id: ActiveValue::Set(receiver_category.map(|category| category.id)),
                kind: ActiveValue::Set(EntryKind::Income.as_str().to_string()),
                amount_minor: ActiveValue::Set(amount.minor()),
                description: ActiveValue::Set(Some(received_description(
                    &sender.username,
                    memo.as_deref(),
                ))),
                occurred_at: ActiveValue::Set(occurred_at),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            transfer.complete(Utc::now())?;
            transfers::ActiveModel {
                id: ActiveValue::Set(transfer.id),
                state: ActiveValue::Set(transfer.state.as_str().to_string()),
                processed_at: ActiveValue::Set(transfer.processed_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            Ok(transfer)
        })?;

        self.emit(LedgerEvent::TransferCompleted {
            transfer_id: transfer.id,
            sender_id: transfer.sender_id,
            receiver_id: transfer.receiver_id,
            amount: transfer.amount,
        });
        Ok(transfer)
    }

    /// Cancels a pending transfer.
    ///
    /// Only the sender can cancel; a transfer the caller did not send is
    /// reported as missing, not forbidden. Cancelled transfers never touched
    /// the ledger, so nothing is reversed.
    pub async fn cancel_transfer(
        &self,
        account_id: i64,
        transfer_id: Uuid,
    ) -> ResultEngine<Transfer> {
        with_tx!(self, |db_tx| {
            let model = transfers::Entity::find_by_id(transfer_id)
                .filter(transfers::Column::SenderId.eq(account_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transfer not exists".to_string()))?;

            let mut transfer = Transfer::try_from(model)?;
            transfer.cancel(Utc::now())?;

            transfers::ActiveModel {
                id: ActiveValue::Set(transfer.id),
                state: ActiveValue::Set(transfer.state.as_str().to_string()),
                processed_at: ActiveValue::Set(transfer.processed_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            Ok(transfer)
        })
    }

    /// Fetches one transfer. Only the two participants can see it.
    pub async fn transfer(&self, account_id: i64, transfer_id: Uuid) -> ResultEngine<Transfer> {
        let model = transfers::Entity::find_by_id(transfer_id)
            .filter(
                Condition::any()
                    .add(transfers::Column::SenderId.eq(account_id))
                    .add(transfers::Column::ReceiverId.eq(account_id)),
            )
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transfer not exists".to_string()))?;
        Transfer::try_from(model)
    }

    /// Sent and received transfers for the account, newest first.
    pub async fn list_transfers(&self, account_id: i64) -> ResultEngine<TransferLists> {
        require_account(&self.database, account_id).await?;

        let sent = transfers::Entity::find()
            .filter(transfers::Column::SenderId.eq(account_id))
            .order_by_desc(transfers::Column::CreatedAt)
            .all(&self.database)
            .await?;
        let received = transfers::Entity::find()
            .filter(transfers::Column::ReceiverId.eq(account_id))
            .order_by_desc(transfers::Column::CreatedAt)
            .all(&self.database)
            .await?;

        Ok(TransferLists {
            sent: sent
                .into_iter()
                .map(Transfer::try_from)
                .collect::<ResultEngine<_>>()?,
            received: received
                .into_iter()
                .map(Transfer::try_from)
                .collect::<ResultEngine<_>>()?,
        })
    }
}

/// Takes the two participant rows in ascending id order by bumping
/// `lock_generation`, as the first writes of the transaction. On Postgres the
/// updates take the row locks; on SQLite the first one promotes this
/// transaction to the writer. Either way the balance re-read that follows
/// sees committed truth.
async fn lock_account_rows(
    db_tx: &DatabaseTransaction,
    sender_id: i64,
    receiver_id: i64,
) -> ResultEngine<()> {
    let (first, second) = if sender_id < receiver_id {
        (sender_id, receiver_id)
    } else {
        (receiver_id, sender_id)
    };

    for account_id in [first, second] {
        let stmt = Statement::from_sql_and_values(
            db_tx.get_database_backend(),
            "UPDATE accounts SET lock_generation = lock_generation + 1 WHERE id = ?",
            vec![account_id.into()],
        );
        let result = db_tx.execute(stmt).await?;
        if result.rows_affected() == 0 {
            return Err(EngineError::KeyNotFound("account not exists".to_string()));
        }
    }
    Ok(())
}

fn sent_description(receiver_username: &str, memo: Option<&str>) -> String {
    match memo {
        Some(memo) => format!("Transfer to {receiver_username}: {memo}"),
        None => format!("Transfer to {receiver_username}"),
    }
}

fn received_description(sender_username: &str, memo: Option<&str>) -> String {
    match memo {
        Some(memo) => format!("Transfer from {sender_username}: {memo}"),
        None => format!("Transfer from {sender_username}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_omit_suffix_without_memo() {
        assert_eq!(sent_description("bob", Some("rent")), "Transfer to bob: rent");
        assert_eq!(sent_description("bob", None), "Transfer to bob");
        assert_eq!(
            received_description("alice", Some("rent")),
            "Transfer from alice: rent"
        );
        assert_eq!(received_description("alice", None), "Transfer from alice");
    }
}
