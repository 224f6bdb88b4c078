//! Transfer primitives and state machine.
//!
//! A `Transfer` moves money between two accounts by writing a mirrored pair
//! of ledger entries. `pending` is the only non-terminal state: a transfer
//! leaves it exactly once, to `completed`, `failed` or `cancelled`, and
//! `processed_at` is stamped at that moment. Terminal states reject every
//! further transition.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransferState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for TransferState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidTransition(format!(
                "unknown transfer state: {other}"
            ))),
        }
    }
}

/// A peer-to-peer transfer between two accounts.
#[derive(Clone, Debug, PartialEq)]
pub struct Transfer {
    pub id: Uuid,
    pub reference: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub amount: Money,
    pub memo: Option<String>,
    pub state: TransferState,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub response_code: Option<String>,
    pub response_message: Option<String>,
}

impl Transfer {
    /// Creates a pending transfer, validating amount and participants.
    pub fn new(
        sender_id: i64,
        receiver_id: i64,
        amount: Money,
        memo: Option<String>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "transfer amount must be > 0".to_string(),
            ));
        }
        if sender_id == receiver_id {
            return Err(EngineError::SelfTransfer);
        }

        let id = Uuid::new_v4();
        Ok(Self {
            id,
            reference: reference_for(id),
            sender_id,
            receiver_id,
            amount,
            memo,
            state: TransferState::Pending,
            created_at: Utc::now(),
            processed_at: None,
            response_code: None,
            response_message: None,
        })
    }

    /// Marks the transfer completed.
    pub fn complete(&mut self, at: DateTime<Utc>) -> ResultEngine<()> {
        self.ensure_pending()?;
        self.state = TransferState::Completed;
        self.processed_at = Some(at);
        Ok(())
    }

    /// Marks the transfer failed, recording the rejection detail.
    pub fn fail(
        &mut self,
        code: &str,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        self.ensure_pending()?;
        self.state = TransferState::Failed;
        self.processed_at = Some(at);
        self.response_code = Some(code.to_string());
        self.response_message = Some(message.into());
        Ok(())
    }

    /// Cancels the transfer. Only a pending transfer can be cancelled.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> ResultEngine<()> {
        if self.state.is_terminal() {
            return Err(EngineError::NotCancellable(format!(
                "state is {}",
                self.state.as_str()
            )));
        }
        self.state = TransferState::Cancelled;
        self.processed_at = Some(at);
        Ok(())
    }

    fn ensure_pending(&self) -> ResultEngine<()> {
        if self.state.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "transfer already {}",
                self.state.as_str()
            )));
        }
        Ok(())
    }
}

/// Short human reference derived from the transfer id: `TR-` plus the first
/// eight hex digits, uppercased.
fn reference_for(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("TR-{}", hex[..8].to_uppercase())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reference: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub state: String,
    pub created_at: DateTimeUtc,
    pub processed_at: Option<DateTimeUtc>,
    pub response_code: Option<String>,
    pub response_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SenderId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ReceiverId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(transfer.id),
            reference: ActiveValue::Set(transfer.reference.clone()),
            sender_id: ActiveValue::Set(transfer.sender_id),
            receiver_id: ActiveValue::Set(transfer.receiver_id),
            amount_minor: ActiveValue::Set(transfer.amount.minor()),
            memo: ActiveValue::Set(transfer.memo.clone()),
            state: ActiveValue::Set(transfer.state.as_str().to_string()),
            created_at: ActiveValue::Set(transfer.created_at),
            processed_at: ActiveValue::Set(transfer.processed_at),
            response_code: ActiveValue::Set(transfer.response_code.clone()),
            response_message: ActiveValue::Set(transfer.response_message.clone()),
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            reference: model.reference,
            sender_id: model.sender_id,
            receiver_id: model.receiver_id,
            amount: Money::new(model.amount_minor),
            memo: model.memo,
            state: TransferState::try_from(model.state.as_str())?,
            created_at: model.created_at,
            processed_at: model.processed_at,
            response_code: model.response_code,
            response_message: model.response_message,
        })
    }
}
