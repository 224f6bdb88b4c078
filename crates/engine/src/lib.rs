pub use accounts::Account;
pub use budgets::BudgetStatus;
pub use categories::Category;
pub use commands::{CreateAccountCmd, RecordTransactionCmd, SetBudgetCmd, TransferCmd};
pub use error::EngineError;
pub use events::LedgerEvent;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, TransferLists};
pub use transactions::{EntryKind, Transaction};
pub use transfers::{Transfer, TransferState};

mod accounts;
mod budgets;
mod categories;
mod commands;
mod error;
mod events;
mod money;
mod ops;
mod pair_lock;
mod transactions;
mod transfers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
