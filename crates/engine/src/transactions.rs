//! Ledger entry primitives.
//!
//! A `Transaction` is a single income or expense row on one account. Every
//! balance in the system is derived from these rows as
//! `SUM(income) - SUM(expense)`; no balance is ever stored.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

/// A ledger entry, with the category resolved to its display name.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub kind: EntryKind,
    pub amount: Money,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn try_from_models(
        model: Model,
        category: Option<String>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            category,
            description: model.description,
            occurred_at: model.occurred_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub kind: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
