//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InsufficientFunds`] thrown when a sender balance cannot cover a transfer.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

use crate::Money;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Sender and receiver must be different accounts")]
    SelfTransfer,
    #[error("\"{0}\" receiver not found!")]
    ReceiverNotFound(String),
    #[error("Insufficient funds: current balance is {balance}")]
    InsufficientFunds { balance: Money },
    #[error("Transfer is not cancellable: {0}")]
    NotCancellable(String),
    #[error("Invalid transfer transition: {0}")]
    InvalidTransition(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Lock wait timed out: {0}")]
    LockTimeout(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::SelfTransfer, Self::SelfTransfer) => true,
            (Self::ReceiverNotFound(a), Self::ReceiverNotFound(b)) => a == b,
            (Self::InsufficientFunds { balance: a }, Self::InsufficientFunds { balance: b }) => {
                a == b
            }
            (Self::NotCancellable(a), Self::NotCancellable(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::LockTimeout(a), Self::LockTimeout(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
