use sea_orm::{Statement, prelude::*};

use crate::{Money, ResultEngine, transactions::EntryKind};

use super::{Engine, accounts::require_account};

impl Engine {
    /// Current balance of an account, derived from its ledger rows.
    pub async fn balance_of(&self, account_id: i64) -> ResultEngine<Money> {
        require_account(&self.database, account_id).await?;
        balance_on(&self.database, account_id).await
    }
}

/// `SUM(income) - SUM(expense)` over the account's ledger.
///
/// Generic over the connection so the transfer path can re-read the sender
/// balance inside its own transaction, after the participant rows are locked.
pub(super) async fn balance_on<C>(conn: &C, account_id: i64) -> ResultEngine<Money>
where
    C: ConnectionTrait,
{
    let income = kind_sum(conn, account_id, EntryKind::Income).await?;
    let expense = kind_sum(conn, account_id, EntryKind::Expense).await?;
    Ok(Money::new(income - expense))
}

async fn kind_sum<C>(conn: &C, account_id: i64, kind: EntryKind) -> ResultEngine<i64>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
         FROM transactions \
         WHERE account_id = ? AND kind = ?",
        vec![account_id.into(), kind.as_str().into()],
    );
    let row = conn.query_one(stmt).await?;
    Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
}
