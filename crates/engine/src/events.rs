//! Post-commit engine events.
//!
//! Operations that change the ledger emit a [`LedgerEvent`] on a broadcast
//! channel only after their database transaction has committed, so a
//! subscriber never observes an event for state that later rolled back.
//! Absent or lagging subscribers never hold up the write path.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::Money;

#[derive(Clone, Debug, PartialEq)]
pub enum LedgerEvent {
    AccountCreated {
        account_id: i64,
        username: String,
    },
    TransactionRecorded {
        account_id: i64,
        transaction_id: i64,
    },
    TransferCompleted {
        transfer_id: Uuid,
        sender_id: i64,
        receiver_id: i64,
        amount: Money,
    },
}

const CHANNEL_CAPACITY: usize = 128;

pub(crate) fn channel() -> broadcast::Sender<LedgerEvent> {
    broadcast::channel(CHANNEL_CAPACITY).0
}
