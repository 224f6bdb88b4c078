//! Category registry per account.
//!
//! A category has a fixed direction (income or expense). `name_norm` is the
//! accent- and case-insensitive lookup key; `(account_id, kind, name_norm)`
//! is unique, so "Salary" can exist on both sides without colliding.

use sea_orm::entity::prelude::*;

use crate::{EngineError, ResultEngine, transactions::EntryKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
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
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Category view: display name plus direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: EntryKind,
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            name: model.name,
            kind: EntryKind::try_from(model.kind.as_str())?,
        })
    }
}
