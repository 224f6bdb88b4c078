use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::{EngineError, LedgerEvent, ResultEngine, events, pair_lock::PairLocks};

mod accounts;
mod balances;
mod budgets;
mod categories;
mod transactions;
mod transfers;

pub use transfers::TransferLists;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Default bound on waiting for a contended transfer pair.
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    events: broadcast::Sender<LedgerEvent>,
    transfer_locks: PairLocks,
    lock_wait: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Subscribe to post-commit ledger events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: LedgerEvent) {
        // A send error only means nobody is subscribed right now.
        let _ = self.events.send(event);
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    lock_wait: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Bound on waiting for a contended transfer pair.
    pub fn lock_wait(mut self, wait: Duration) -> EngineBuilder {
        self.lock_wait = wait;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            events: events::channel(),
            transfer_locks: PairLocks::new(),
            lock_wait: self.lock_wait,
        })
    }
}
