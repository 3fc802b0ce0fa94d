use sea_orm_migration::prelude::*;

use crate::m20240105_000001_users::Users;
use crate::m20240112_000001_services::Services;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    CustomerId,
    ServiceId,
    ProviderId,
    ScheduledDate,
    ScheduledTime,
    DurationMinutes,
    Status,
    TotalAmountMinor,
    Notes,
    SlotKey,
    ConfirmedAt,
    StartedAt,
    CompletedAt,
    CancelledAt,
    CancelledBy,
    CancellationReason,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::CustomerId).string().not_null())
                    .col(ColumnDef::new(Bookings::ServiceId).string().not_null())
                    .col(ColumnDef::new(Bookings::ProviderId).string().not_null())
                    .col(ColumnDef::new(Bookings::ScheduledDate).date().not_null())
                    .col(ColumnDef::new(Bookings::ScheduledTime).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Status).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::TotalAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Notes).string())
                    .col(ColumnDef::new(Bookings::SlotKey).string())
                    .col(ColumnDef::new(Bookings::ConfirmedAt).timestamp())
                    .col(ColumnDef::new(Bookings::StartedAt).timestamp())
                    .col(ColumnDef::new(Bookings::CompletedAt).timestamp())
                    .col(ColumnDef::new(Bookings::CancelledAt).timestamp())
                    .col(ColumnDef::new(Bookings::CancelledBy).string())
                    .col(ColumnDef::new(Bookings::CancellationReason).string())
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-customer_id")
                            .from(Bookings::Table, Bookings::CustomerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-service_id")
                            .from(Bookings::Table, Bookings::ServiceId)
                            .to(Services::Table, Services::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // NULL slot keys (inactive bookings) don't collide, so this keeps at
        // most one active booking per provider/date/time even under
        // concurrent creates.
        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-slot_key")
                    .table(Bookings::Table)
                    .col(Bookings::SlotKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-customer_id-created_at")
                    .table(Bookings::Table)
                    .col(Bookings::CustomerId)
                    .col(Bookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-provider_id-created_at")
                    .table(Bookings::Table)
                    .col(Bookings::ProviderId)
                    .col(Bookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}
