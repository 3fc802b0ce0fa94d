use sea_orm_migration::prelude::*;

use crate::m20240105_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum LoyaltyAccounts {
    Table,
    UserId,
    Points,
    LifetimePoints,
}

#[derive(Iden)]
enum ProviderDailyStats {
    Table,
    ProviderId,
    Day,
    CompletedBookings,
    EarningsMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoyaltyAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyAccounts::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::Points)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::LifetimePoints)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loyalty_accounts-user_id")
                            .from(LoyaltyAccounts::Table, LoyaltyAccounts::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProviderDailyStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProviderDailyStats::ProviderId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProviderDailyStats::Day).date().not_null())
                    .col(
                        ColumnDef::new(ProviderDailyStats::CompletedBookings)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderDailyStats::EarningsMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProviderDailyStats::ProviderId)
                            .col(ProviderDailyStats::Day),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProviderDailyStats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoyaltyAccounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
