use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub balance_minor: i64,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub name: String,
        pub kind: transaction::EntryKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Income,
        Expense,
    }

    impl EntryKind {
        /// Returns the canonical kind string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: EntryKind,
        /// Must be > 0; the kind defines the direction.
        pub amount_minor: i64,
        pub category: Option<String>,
        pub description: Option<String>,
        /// RFC3339 timestamp, including timezone offset. Absent means now.
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub kind: EntryKind,
        pub amount_minor: i64,
        pub category: Option<String>,
        pub description: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransferState {
        Pending,
        Completed,
        Failed,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        /// Username of the receiving account.
        pub receiver: String,
        /// Must be > 0.
        pub amount_minor: i64,
        pub memo: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        /// Short human reference, e.g. `TR-1A2B3C4D`.
        pub reference: String,
        pub sender: String,
        pub receiver: String,
        pub amount_minor: i64,
        pub memo: Option<String>,
        pub state: TransferState,
        pub created_at: DateTime<Utc>,
        pub processed_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferListResponse {
        pub sent: Vec<TransferView>,
        pub received: Vec<TransferView>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSet {
        pub category: String,
        pub year: i32,
        pub month: u32,
        /// Must be > 0.
        pub cap_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetList {
        pub year: Option<i32>,
        pub month: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub category: String,
        pub year: i32,
        pub month: u32,
        pub cap_minor: i64,
        /// Expense total accrued in that month so far.
        pub spent_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetListResponse {
        pub budgets: Vec<BudgetView>,
    }
}
