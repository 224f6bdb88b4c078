//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Monedero:
//!
//! - `accounts`: authentication plus the per-row lock generation counter
//! - `categories`: per-account entry labels, unique by normalized name
//! - `transactions`: ledger entries; balances are derived from these rows
//! - `transfers`: peer-to-peer movement records and their lifecycle state
//! - `budgets`: monthly caps per expense category

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Username,
    Password,
    DisplayName,
    CreatedAt,
    LockGeneration,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    AccountId,
    Name,
    NameNorm,
    Kind,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    AccountId,
    CategoryId,
    Kind,
    AmountMinor,
    Description,
    OccurredAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    Reference,
    SenderId,
    ReceiverId,
    AmountMinor,
    Memo,
    State,
    CreatedAt,
    ProcessedAt,
    ResponseCode,
    ResponseMessage,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    AccountId,
    CategoryId,
    Year,
    Month,
    CapMinor,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Username).string().not_null())
                    .col(ColumnDef::new(Accounts::Password).string().not_null())
                    .col(ColumnDef::new(Accounts::DisplayName).string().not_null())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Accounts::LockGeneration)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-username-unique")
                    .table(Accounts::Table)
                    .col(Accounts::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-account_id")
                            .from(Categories::Table, Categories::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-account_id-kind-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::AccountId)
                    .col(Categories::Kind)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CategoryId).big_integer())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-category_id")
                    .table(Transactions::Table)
                    .col(Transactions::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transfers::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Transfers::Reference).string().not_null())
                    .col(ColumnDef::new(Transfers::SenderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transfers::ReceiverId)
                            .big_integer()
                            .not_null()
                            .check(
                                Expr::col(Transfers::ReceiverId)
                                    .not_equals(Transfers::SenderId),
                            ),
                    )
                    .col(
                        ColumnDef::new(Transfers::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transfers::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(Transfers::Memo).string())
                    .col(
                        ColumnDef::new(Transfers::State)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Transfers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Transfers::ProcessedAt).timestamp())
                    .col(ColumnDef::new(Transfers::ResponseCode).string())
                    .col(ColumnDef::new(Transfers::ResponseMessage).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-sender_id")
                            .from(Transfers::Table, Transfers::SenderId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-receiver_id")
                            .from(Transfers::Table, Transfers::ReceiverId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-reference-unique")
                    .table(Transfers::Table)
                    .col(Transfers::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-sender_id-created_at")
                    .table(Transfers::Table)
                    .col(Transfers::SenderId)
                    .col(Transfers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-receiver_id-created_at")
                    .table(Transfers::Table)
                    .col(Transfers::ReceiverId)
                    .col(Transfers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Budgets::CategoryId).big_integer().not_null())
                    .col(ColumnDef::new(Budgets::Year).integer().not_null())
                    .col(
                        ColumnDef::new(Budgets::Month)
                            .integer()
                            .not_null()
                            .check(Expr::col(Budgets::Month).between(1, 12)),
                    )
                    .col(
                        ColumnDef::new(Budgets::CapMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Budgets::CapMinor).gt(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-account_id")
                            .from(Budgets::Table, Budgets::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-category_id")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-account_id-category_id-year-month-unique")
                    .table(Budgets::Table)
                    .col(Budgets::AccountId)
                    .col(Budgets::CategoryId)
                    .col(Budgets::Year)
                    .col(Budgets::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
