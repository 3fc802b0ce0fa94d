//! Per-provider daily counters, maintained with atomic increments when a
//! booking completes.

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// Platform commission, percent of the booking total.
pub const COMMISSION_PERCENT: i64 = 15;

/// Provider share of a completed booking, after commission.
pub fn provider_earnings(total_amount_minor: i64) -> i64 {
    total_amount_minor * (100 - COMMISSION_PERCENT) / 100
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderDailyStats {
    pub provider_id: String,
    pub day: NaiveDate,
    pub completed_bookings: i64,
    pub earnings_minor: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "provider_daily_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub provider_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub day: Date,
    pub completed_bookings: i64,
    pub earnings_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ProviderDailyStats> for ActiveModel {
    fn from(value: &ProviderDailyStats) -> Self {
        Self {
            provider_id: ActiveValue::Set(value.provider_id.clone()),
            day: ActiveValue::Set(value.day),
            completed_bookings: ActiveValue::Set(value.completed_bookings),
            earnings_minor: ActiveValue::Set(value.earnings_minor),
        }
    }
}

impl From<Model> for ProviderDailyStats {
    fn from(model: Model) -> Self {
        Self {
            provider_id: model.provider_id,
            day: model.day,
            completed_bookings: model.completed_bookings,
            earnings_minor: model.earnings_minor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earnings_take_fifteen_percent_commission() {
        assert_eq!(provider_earnings(100_000), 85_000);
        assert_eq!(provider_earnings(0), 0);
        // Integer arithmetic truncates sub-cent remainders.
        assert_eq!(provider_earnings(99), 84);
    }
}
