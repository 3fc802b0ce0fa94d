use sea_orm_migration::prelude::*;

use crate::m20240105_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Services {
    Table,
    Id,
    ProviderId,
    Name,
    Description,
    PriceMinor,
    Currency,
    InstantBooking,
    Active,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Services::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Services::ProviderId).string().not_null())
                    .col(ColumnDef::new(Services::Name).string().not_null())
                    .col(ColumnDef::new(Services::Description).string())
                    .col(
                        ColumnDef::new(Services::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Services::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Services::InstantBooking)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Services::Active).boolean().not_null())
                    .col(ColumnDef::new(Services::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-services-provider_id")
                            .from(Services::Table, Services::ProviderId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-services-provider_id")
                    .table(Services::Table)
                    .col(Services::ProviderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Services::Table).to_owned())
            .await
    }
}
