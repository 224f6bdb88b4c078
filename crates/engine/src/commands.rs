//! Command structs for engine operations.
//!
//! These types group parameters for write operations (account creation,
//! ledger entries, transfers, budget caps), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::{Money, transactions::EntryKind};

/// Provision a new account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub seed_income: Option<Money>,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: display_name.into(),
            seed_income: None,
        }
    }

    /// Posts an opening income entry right after the account is created.
    #[must_use]
    pub fn seed_income(mut self, amount: Money) -> Self {
        self.seed_income = Some(amount);
        self
    }
}

/// Record a ledger entry on one account.
#[derive(Clone, Debug)]
pub struct RecordTransactionCmd {
    pub account_id: i64,
    pub kind: EntryKind,
    pub amount: Money,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl RecordTransactionCmd {
    #[must_use]
    pub fn new(account_id: i64, kind: EntryKind, amount: Money) -> Self {
        Self {
            account_id,
            kind,
            amount,
            category: None,
            description: None,
            occurred_at: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}

/// Move money from one account to another.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub sender_id: i64,
    pub receiver_username: String,
    pub amount: Money,
    pub memo: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(sender_id: i64, receiver_username: impl Into<String>, amount: Money) -> Self {
        Self {
            sender_id,
            receiver_username: receiver_username.into(),
            amount,
            memo: None,
        }
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Set or replace a monthly cap on an expense category.
#[derive(Clone, Debug)]
pub struct SetBudgetCmd {
    pub account_id: i64,
    pub category: String,
    pub year: i32,
    pub month: u32,
    pub cap: Money,
}

impl SetBudgetCmd {
    #[must_use]
    pub fn new(
        account_id: i64,
        category: impl Into<String>,
        year: i32,
        month: u32,
        cap: Money,
    ) -> Self {
        Self {
            account_id,
            category: category.into(),
            year,
            month,
            cap,
        }
    }
}
