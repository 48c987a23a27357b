//! Initial schema migration.
//!
//! Creates the tables the splitting engine persists:
//!
//! - `bills`: one-off expenses with a total and a head-count
//! - `bill_payments`: one row per person owing part of a bill
//! - `rides`: recurring per-occurrence costs over a date range
//! - `ride_payments`: one row per ride participant
//! - `presences`: attendance of a ride participant on one date

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Bills {
    Table,
    Id,
    Description,
    TotalMinor,
    PersonCount,
}

#[derive(Iden)]
enum BillPayments {
    Table,
    Id,
    BillId,
    Person,
    ValueMinor,
    IsPaid,
    IsCustom,
}

#[derive(Iden)]
enum Rides {
    Table,
    Id,
    Description,
    UnitCostMinor,
    OccurrenceCount,
    StartDate,
    EndDate,
    IncludeWeekends,
}

#[derive(Iden)]
enum RidePayments {
    Table,
    Id,
    RideId,
    Person,
    ValueMinor,
    IsPaid,
}

#[derive(Iden)]
enum Presences {
    Table,
    Id,
    RidePaymentId,
    Date,
    Attendance,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Bills
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bills::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bills::Description).string().not_null())
                    .col(ColumnDef::new(Bills::TotalMinor).big_integer().not_null())
                    .col(ColumnDef::new(Bills::PersonCount).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Bill payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BillPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillPayments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillPayments::BillId).big_integer().not_null())
                    .col(ColumnDef::new(BillPayments::Person).string().not_null())
                    .col(
                        ColumnDef::new(BillPayments::ValueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BillPayments::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BillPayments::IsCustom)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bill_payments-bill_id")
                            .from(BillPayments::Table, BillPayments::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bill_payments-bill_id")
                    .table(BillPayments::Table)
                    .col(BillPayments::BillId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Rides
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Rides::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rides::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rides::Description).string().not_null())
                    .col(ColumnDef::new(Rides::UnitCostMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Rides::OccurrenceCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Rides::StartDate).date().not_null())
                    .col(ColumnDef::new(Rides::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Rides::IncludeWeekends)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Ride payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RidePayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RidePayments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RidePayments::RideId).big_integer().not_null())
                    .col(ColumnDef::new(RidePayments::Person).string().not_null())
                    .col(
                        ColumnDef::new(RidePayments::ValueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RidePayments::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ride_payments-ride_id")
                            .from(RidePayments::Table, RidePayments::RideId)
                            .to(Rides::Table, Rides::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ride_payments-ride_id")
                    .table(RidePayments::Table)
                    .col(RidePayments::RideId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Presences
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Presences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Presences::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Presences::RidePaymentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Presences::Date).date().not_null())
                    .col(
                        ColumnDef::new(Presences::Attendance)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-presences-ride_payment_id")
                            .from(Presences::Table, Presences::RidePaymentId)
                            .to(RidePayments::Table, RidePayments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One presence per participant and date.
        manager
            .create_index(
                Index::create()
                    .name("idx-presences-ride_payment_id-date-unique")
                    .table(Presences::Table)
                    .col(Presences::RidePaymentId)
                    .col(Presences::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Presences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RidePayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rides::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await?;
        Ok(())
    }
}
