use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, Statement, TransactionTrait, prelude::*};

use crate::{
    EngineError, Money, ResultEngine, SetBudgetCmd,
    budgets::{self, BudgetStatus},
    categories,
    transactions::EntryKind,
    util::normalize_category_key,
};

use super::{Engine, accounts::require_account, with_tx};

impl Engine {
    /// Sets or replaces the monthly cap for an expense category.
    ///
    /// There is at most one budget per account, category and month; setting
    /// it again overwrites the cap. The category must already exist as an
    /// expense category of the account.
    pub async fn set_budget(&self, cmd: SetBudgetCmd) -> ResultEngine<BudgetStatus> {
        if !cmd.cap.is_positive() {
            return Err(EngineError::InvalidAmount(
                "budget cap must be > 0".to_string(),
            ));
        }
        let month = checked_month(cmd.month)?;

        with_tx!(self, |db_tx| {
            require_account(&db_tx, cmd.account_id).await?;

            let key = normalize_category_key(&cmd.category).ok_or_else(|| {
                EngineError::InvalidAmount("category name must not be empty".to_string())
            })?;
            let category = categories::Entity::find()
                .filter(categories::Column::AccountId.eq(cmd.account_id))
                .filter(categories::Column::Kind.eq(EntryKind::Expense.as_str()))
                .filter(categories::Column::NameNorm.eq(key.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

            let existing = budgets::Entity::find()
                .filter(budgets::Column::AccountId.eq(cmd.account_id))
                .filter(budgets::Column::CategoryId.eq(category.id))
                .filter(budgets::Column::Year.eq(cmd.year))
                .filter(budgets::Column::Month.eq(month))
                .one(&db_tx)
                .await?;
            match existing {
                Some(model) => {
                    budgets::ActiveModel {
                        id: ActiveValue::Set(model.id),
                        cap_minor: ActiveValue::Set(cmd.cap.minor()),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?;
                }
                None => {
                    budgets::ActiveModel {
                        account_id: ActiveValue::Set(cmd.account_id),
                        category_id: ActiveValue::Set(category.id),
                        year: ActiveValue::Set(cmd.year),
                        month: ActiveValue::Set(month),
                        cap_minor: ActiveValue::Set(cmd.cap.minor()),
                        ..Default::default()
                    }
                    .insert(&db_tx)
                    .await?;
                }
            }

            let (start, end) = month_window(cmd.year, cmd.month)?;
            let spent =
                spent_between(&db_tx, cmd.account_id, category.id, start, end).await?;
            Ok(BudgetStatus {
                category: category.name,
                year: cmd.year,
                month: cmd.month,
                cap: cmd.cap,
                spent,
            })
        })
    }

    /// Budgets of the account for one month, with the spend accrued so far.
    pub async fn list_budgets(
        &self,
        account_id: i64,
        year: i32,
        month: u32,
    ) -> ResultEngine<Vec<BudgetStatus>> {
        require_account(&self.database, account_id).await?;
        let month_db = checked_month(month)?;

        let rows = budgets::Entity::find()
            .filter(budgets::Column::AccountId.eq(account_id))
            .filter(budgets::Column::Year.eq(year))
            .filter(budgets::Column::Month.eq(month_db))
            .find_also_related(categories::Entity)
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;

        let (start, end) = month_window(year, month)?;
        let mut statuses = Vec::with_capacity(rows.len());
        for (budget, category) in rows {
            let Some(category) = category else {
                continue;
            };
            let spent =
                spent_between(&self.database, account_id, category.id, start, end).await?;
            statuses.push(BudgetStatus {
                category: category.name,
                year: budget.year,
                month,
                cap: Money::new(budget.cap_minor),
                spent,
            });
        }
        Ok(statuses)
    }
}

fn checked_month(month: u32) -> ResultEngine<i32> {
    match i32::try_from(month) {
        Ok(month) if (1..=12).contains(&month) => Ok(month),
        _ => Err(EngineError::InvalidAmount(
            "month must be between 1 and 12".to_string(),
        )),
    }
}

/// Half-open UTC window covering one calendar month.
fn month_window(year: i32, month: u32) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| EngineError::InvalidAmount("invalid budget period".to_string()))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| EngineError::InvalidAmount("invalid budget period".to_string()))?;
    Ok((start, end))
}

async fn spent_between<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    category_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ResultEngine<Money> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "SELECT COALESCE(SUM(amount_minor), 0) AS sum FROM transactions \
         WHERE account_id = ? AND category_id = ? AND kind = ? \
         AND occurred_at >= ? AND occurred_at < ?",
        vec![
            account_id.into(),
            category_id.into(),
            EntryKind::Expense.as_str().into(),
            start.into(),
            end.into(),
        ],
    );
    let row = conn.query_one(stmt).await?;
    let spent: i64 = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);
    Ok(Money::new(spent))
}
