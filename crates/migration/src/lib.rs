pub use sea_orm_migration::prelude::*;

mod m20240105_000001_users;
mod m20240105_000002_wallet;
mod m20240112_000001_services;
mod m20240112_000002_bookings;
mod m20240119_000001_loyalty;
mod m20240119_000002_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240105_000001_users::Migration),
            Box::new(m20240105_000002_wallet::Migration),
            Box::new(m20240112_000001_services::Migration),
            Box::new(m20240112_000002_bookings::Migration),
            Box::new(m20240119_000001_loyalty::Migration),
            Box::new(m20240119_000002_notifications::Migration),
        ]
    }
}
